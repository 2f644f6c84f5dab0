use stationdb::directory::DirectoryBackend;
use stationdb::node::PropId;
use stationdb::NodeId;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tempfile::TempDir;

pub fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn temp_backend() -> (TempDir, DirectoryBackend) {
    let dir = TempDir::new().unwrap();
    let backend = DirectoryBackend::with_path(dir.path().join("iradio-2.2.xml")).unwrap();
    (dir, backend)
}

pub fn reopen(path: PathBuf) -> DirectoryBackend {
    DirectoryBackend::with_path(path).unwrap()
}

/// (name, genre, primary location, alternates) for every station.
pub fn station_tuples(
    backend: &DirectoryBackend,
) -> BTreeSet<(String, String, String, Vec<String>)> {
    let db = backend.db();
    db.get(backend.get_all_stations())
        .unwrap()
        .children()
        .iter()
        .map(|id| {
            let node = db.get(*id).unwrap();
            (
                node.name().to_string(),
                node.string(PropId::Genre).unwrap().to_string(),
                node.string(PropId::Location).unwrap().to_string(),
                node.list(PropId::AltLocations)
                    .map(|alts| alts.to_vec())
                    .unwrap_or_default(),
            )
        })
        .collect()
}

pub fn station_named(backend: &DirectoryBackend, name: &str) -> NodeId {
    backend.lookup_by_title(name).unwrap().thaw()
}

pub fn write_seed(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, format!("<iradio-cache><name>test</name>{}</iradio-cache>", body))
        .unwrap();
    path
}
