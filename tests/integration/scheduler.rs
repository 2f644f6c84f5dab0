use crate::integration::support::{reopen, station_named, temp_backend, urls};
use parking_lot::Mutex;
use stationdb::directory::{LoadOutcome, SaveSchedule, SaveScheduler};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn saves_at_start_then_on_interval_and_at_shutdown() {
    let (_dir, mut backend) = temp_backend();
    backend.load().unwrap();
    backend
        .add_station_full(&urls(&["http://a"]), "First", "Rock")
        .unwrap();
    let path = backend.db_file().to_path_buf();
    let backend = Arc::new(Mutex::new(backend));

    let scheduler = SaveScheduler::spawn(Arc::clone(&backend), SaveSchedule::default());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(scheduler.completed_saves(), 1);
    assert!(std::fs::read_to_string(&path).unwrap().contains("First"));

    backend
        .lock()
        .add_station_full(&urls(&["http://b"]), "Second", "Rock")
        .unwrap();
    tokio::time::sleep(Duration::from_secs(76)).await;
    assert!(scheduler.completed_saves() >= 2);
    assert!(std::fs::read_to_string(&path).unwrap().contains("Second"));

    backend
        .lock()
        .add_station_full(&urls(&["http://c"]), "Third", "Rock")
        .unwrap();
    scheduler.shutdown().await.unwrap();
    assert!(std::fs::read_to_string(&path).unwrap().contains("Third"));
}

#[tokio::test(start_paused = true)]
async fn failed_save_is_retried_next_cycle() {
    let (dir, mut backend) = temp_backend();
    backend.load().unwrap();
    let path = backend.db_file().to_path_buf();
    // a directory where the temp file should go makes the write fail
    let blocker = dir.path().join("iradio-2.2.xml.tmp");
    std::fs::create_dir(&blocker).unwrap();
    let backend = Arc::new(Mutex::new(backend));

    let schedule = SaveSchedule {
        interval: Duration::from_secs(10),
        jitter: Duration::ZERO,
    };
    let scheduler = SaveScheduler::spawn(Arc::clone(&backend), schedule);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(scheduler.completed_saves(), 0);
    assert!(!path.exists());

    std::fs::remove_dir(&blocker).unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(scheduler.completed_saves(), 1);
    assert!(path.exists());
    scheduler.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn spawning_before_load_keeps_saved_stations() {
    let (_dir, mut backend) = temp_backend();
    backend
        .add_station_full(&urls(&["http://keep"]), "Keeper", "Jazz")
        .unwrap();
    backend.save().unwrap();
    let path = backend.db_file().to_path_buf();

    let backend = Arc::new(Mutex::new(reopen(path.clone())));
    let scheduler = SaveScheduler::spawn(Arc::clone(&backend), SaveSchedule::default());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(scheduler.completed_saves(), 0);
    assert!(std::fs::read_to_string(&path).unwrap().contains("Keeper"));

    let outcome = backend.lock().load().unwrap();
    assert!(matches!(outcome, LoadOutcome::Restored { .. }));
    station_named(&backend.lock(), "Keeper");

    tokio::time::sleep(Duration::from_secs(76)).await;
    assert_eq!(scheduler.completed_saves(), 1);
    scheduler.shutdown().await.unwrap();
    assert!(std::fs::read_to_string(&path).unwrap().contains("Keeper"));
}

#[tokio::test(start_paused = true)]
async fn shutdown_without_load_writes_nothing() {
    let (_dir, backend) = temp_backend();
    let path = backend.db_file().to_path_buf();
    let backend = Arc::new(Mutex::new(backend));

    let scheduler = SaveScheduler::spawn(Arc::clone(&backend), SaveSchedule::default());
    tokio::time::sleep(Duration::from_millis(10)).await;
    scheduler.shutdown().await.unwrap();
    assert!(!path.exists());
}
