use crate::integration::support::{reopen, station_tuples, temp_backend, urls, write_seed};
use stationdb::config::DirectoryConfig;
use stationdb::directory::persist;
use stationdb::directory::{DirectoryBackend, LoadOutcome};
use stationdb::node::PropId;
use stationdb::DirectoryError;
use std::fs;

#[test]
fn added_station_is_filed_under_its_genre() {
    let (_dir, mut backend) = temp_backend();
    backend
        .add_station_full(&urls(&["http://a/stream"]), "Test FM", "Jazz")
        .unwrap();

    let jazz = backend.get_genre_by_name("Jazz").unwrap();
    let db = backend.db();
    let children = db.get(jazz).unwrap().children();
    assert_eq!(children.len(), 1);
    let station = db.get(children[0]).unwrap();
    assert_eq!(station.name(), "Test FM");
    assert_eq!(station.string(PropId::Location).unwrap(), "http://a/stream");
    assert_eq!(backend.genre_count(), 1);
    assert_eq!(backend.get_genre_names(), vec!["Jazz"]);
}

#[test]
fn old_version_snapshot_is_deleted_and_reseeded() {
    let (dir, mut backend) = temp_backend();
    let seed = write_seed(
        &dir,
        "seed.xml",
        "<station><name>Seeded</name><url>http://seed</url><genre>Pop</genre></station>",
    );
    fs::write(
        backend.db_file(),
        r#"<rhythmbox_iradio version="2.0"><node id="9"/></rhythmbox_iradio>"#,
    )
    .unwrap();

    let config = DirectoryConfig {
        db_file: backend.db_file().to_path_buf(),
        seed_file: Some(seed),
        ..DirectoryConfig::default()
    };
    backend = DirectoryBackend::new(&config).unwrap();
    let outcome = backend.load().unwrap();

    match outcome {
        LoadOutcome::Seeded { stations, reason } => {
            assert_eq!(stations, 1);
            assert!(matches!(reason, Some(DirectoryError::VersionMismatch { .. })));
        }
        other => panic!("expected seed fallback, got {:?}", other),
    }
    assert!(!config.db_file.exists());
    assert!(backend.lookup_by_title("Seeded").is_some());
    assert!(!backend.db().contains(stationdb::NodeId(9)));
}

#[test]
fn malformed_snapshot_is_deleted_and_reseeded() {
    let (_dir, mut backend) = temp_backend();
    fs::write(backend.db_file(), "<rhythmbox_iradio version=\"2.2\"><node").unwrap();

    match backend.load().unwrap() {
        LoadOutcome::Seeded { stations, reason } => {
            assert!(stations > 0);
            assert!(reason.unwrap().is_recoverable_load_failure());
        }
        other => panic!("expected seed fallback, got {:?}", other),
    }
    assert!(!backend.db_file().exists());
}

#[test]
fn incomplete_seed_station_is_skipped() {
    let (dir, mut backend) = temp_backend();
    let seed = write_seed(
        &dir,
        "import.xml",
        "<station><name>No Genre</name><url>http://x</url></station>\
         <station><name>Complete</name><url>http://y</url><genre>Rock</genre></station>",
    );

    let added = backend.import_seed(&seed).unwrap();
    assert_eq!(added, 1);
    assert!(backend.lookup_by_title("No Genre").is_none());
    let complete = backend.lookup_by_title("Complete").unwrap();
    let node = backend.db().get(complete.id()).unwrap();
    assert_eq!(node.string(PropId::Source).unwrap(), "import");
    assert_eq!(backend.genre_count(), 1);
}

#[test]
fn interrupted_save_leaves_previous_snapshot_intact() {
    let (_dir, mut backend) = temp_backend();
    backend
        .add_station_full(&urls(&["http://a"]), "First", "Rock")
        .unwrap();
    backend.save().unwrap();
    let committed = fs::read(backend.db_file()).unwrap();

    backend
        .add_station_full(&urls(&["http://b"]), "Second", "Rock")
        .unwrap();
    let bytes = backend.render_snapshot().unwrap();
    let tmp = persist::write_temp(backend.db_file(), &bytes).unwrap();
    // crash here: the rename never happens

    assert!(tmp.exists());
    assert_eq!(fs::read(backend.db_file()).unwrap(), committed);

    let mut reopened = reopen(backend.db_file().to_path_buf());
    assert!(matches!(
        reopened.load().unwrap(),
        LoadOutcome::Restored { .. }
    ));
    let names: Vec<String> = station_tuples(&reopened)
        .into_iter()
        .map(|(name, ..)| name)
        .collect();
    assert_eq!(names, vec!["First"]);
}
