use crate::integration::support::{reopen, station_named, station_tuples, temp_backend, urls};
use stationdb::directory::{DirectoryEvent, LoadOutcome};
use stationdb::node::PropId;

#[test]
fn save_then_load_restores_stations_and_structure() {
    let (_dir, mut backend) = temp_backend();
    backend
        .add_station_full(&urls(&["http://a", "http://a2", "http://a3"]), "Alpha", "Jazz")
        .unwrap();
    backend
        .add_station_full(&urls(&["http://b"]), "Beta & <Co>", "Rock")
        .unwrap();
    backend
        .add_station_full(&urls(&["http://c"]), "Gamma", "Jazz")
        .unwrap();
    let gamma = station_named(&backend, "Gamma");
    backend.update_play_statistics(gamma).unwrap();
    backend.save().unwrap();

    let mut restored = reopen(backend.db_file().to_path_buf());
    let events = restored.subscribe();
    assert!(matches!(
        restored.load().unwrap(),
        LoadOutcome::Restored { nodes: 5 }
    ));
    assert_eq!(events.try_iter().collect::<Vec<_>>(), vec![DirectoryEvent::Changed]);

    assert_eq!(station_tuples(&restored), station_tuples(&backend));
    assert_eq!(restored.get_genre_names(), backend.get_genre_names());
    assert_eq!(restored.genre_count(), 2);
    assert_eq!(restored.station_count(), 3);

    let db = restored.db();
    for name in ["Alpha", "Gamma"] {
        let station = station_named(&restored, name);
        let jazz = restored.get_genre_by_name("Jazz").unwrap();
        assert!(db.has_child(jazz, station));
        assert!(db.has_child(restored.get_all_stations(), station));
        assert_eq!(db.get(station).unwrap().node_ref(PropId::RealGenre).unwrap(), jazz);
    }
    let jazz = restored.get_genre_by_name("Jazz").unwrap();
    assert_eq!(db.get(jazz).unwrap().ref_count(), 3);

    let gamma = db.get(station_named(&restored, "Gamma")).unwrap();
    assert_eq!(gamma.integer(PropId::PlayCount).unwrap(), 1);
    assert_eq!(
        gamma.string(PropId::NameSortKey).unwrap(),
        "gamma"
    );
}

#[test]
fn restored_directory_keeps_working() {
    let (_dir, mut backend) = temp_backend();
    backend
        .add_station_full(&urls(&["http://a"]), "Alpha", "Jazz")
        .unwrap();
    backend.save().unwrap();

    let mut restored = reopen(backend.db_file().to_path_buf());
    restored.load().unwrap();
    let jazz = restored.get_genre_by_name("Jazz").unwrap();
    let new = restored
        .add_station_full(&urls(&["http://n"]), "New", "Jazz")
        .unwrap()
        .unwrap();
    assert!(restored.db().has_child(jazz, new));
    assert_eq!(restored.genre_count(), 1);

    let alpha = station_named(&restored, "Alpha");
    assert!(new > alpha);
    restored.remove_node(alpha).unwrap();
    assert_eq!(restored.db().get(jazz).unwrap().ref_count(), 2);
}

#[test]
fn duplicate_name_is_not_added_twice() {
    let (_dir, mut backend) = temp_backend();
    let first = backend
        .add_station_full(&urls(&["http://a"]), "Same", "Jazz")
        .unwrap();
    let second = backend
        .add_station_full(&urls(&["http://other"]), "Same", "Rock")
        .unwrap();
    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(backend.station_count(), 1);
    assert!(backend.get_genre_by_name("Rock").is_none());
}

#[test]
fn known_location_is_not_added_again() {
    let (_dir, mut backend) = temp_backend();
    backend
        .add_station_full(&urls(&["http://a", "http://mirror"]), "Alpha", "Jazz")
        .unwrap();
    assert!(backend.add_station_from_uri("http://a").unwrap().is_none());
    assert!(backend.add_station_from_uri("http://mirror").unwrap().is_none());
    assert_eq!(backend.station_count(), 1);
}

#[test]
fn stations_with_same_genre_share_one_node() {
    let (_dir, mut backend) = temp_backend();
    let a = backend
        .add_station_full(&urls(&["http://a"]), "A", "Jazz")
        .unwrap()
        .unwrap();
    let b = backend
        .add_station_full(&urls(&["http://b"]), "B", "Jazz")
        .unwrap()
        .unwrap();
    let db = backend.db();
    let genre_a = db.get(a).unwrap().node_ref(PropId::RealGenre).unwrap();
    let genre_b = db.get(b).unwrap().node_ref(PropId::RealGenre).unwrap();
    assert_eq!(genre_a, genre_b);
    assert_eq!(backend.genre_count(), 1);
    assert_eq!(db.get(genre_a).unwrap().children(), &[a, b]);
}

#[test]
fn surrounding_whitespace_survives_reload() {
    let (_dir, mut backend) = temp_backend();
    backend
        .add_station_full(&urls(&["http://x", " http://x2 "]), " Radio X ", "Jazz ")
        .unwrap();
    backend
        .add_station_full(&urls(&["http://y"]), "Radio X", "Jazz")
        .unwrap();
    backend.save().unwrap();

    let mut restored = reopen(backend.db_file().to_path_buf());
    assert!(matches!(
        restored.load().unwrap(),
        LoadOutcome::Restored { nodes: 4 }
    ));
    assert_eq!(station_tuples(&restored), station_tuples(&backend));
    assert_eq!(restored.station_count(), 2);
    assert_eq!(restored.get_genre_names(), vec!["Jazz ".to_string(), "Jazz".to_string()]);
    station_named(&restored, " Radio X ");
}
