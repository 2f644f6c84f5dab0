//! Periodic background save of the station directory.
//!
//! The first save runs as soon as the task starts, then the task sleeps for
//! the interval plus a random jitter and saves again. Nothing is written until
//! the directory has been loaded, so the task may be spawned before `load`.
//! A save that is still running when the next one comes due is skipped.
//! Failed saves are logged and retried on the next cycle.

use super::DirectoryBackend;
use crate::config::DirectoryConfig;
use crate::error::Result;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Save cadence: `interval` plus up to `jitter` extra.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveSchedule {
    pub interval: Duration,
    pub jitter: Duration,
}

impl Default for SaveSchedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            jitter: Duration::from_secs(15),
        }
    }
}

impl SaveSchedule {
    pub fn from_config(config: &DirectoryConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.save_interval_secs),
            jitter: Duration::from_secs(config.save_jitter_secs),
        }
    }

    /// Delay until the next save, in `interval..=interval + jitter`.
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.interval + Duration::from_millis(extra)
    }
}

/// Handle to the running save task.
pub struct SaveScheduler {
    backend: Arc<Mutex<DirectoryBackend>>,
    stop: Arc<Notify>,
    in_flight: Arc<AtomicBool>,
    completed: Arc<AtomicUsize>,
    handle: Option<JoinHandle<()>>,
}

impl SaveScheduler {
    /// Starts the save task on the current tokio runtime.
    pub fn spawn(backend: Arc<Mutex<DirectoryBackend>>, schedule: SaveSchedule) -> Self {
        let stop = Arc::new(Notify::new());
        let in_flight = Arc::new(AtomicBool::new(false));
        let completed = Arc::new(AtomicUsize::new(0));

        let handle = {
            let backend = Arc::clone(&backend);
            let stop = Arc::clone(&stop);
            let in_flight = Arc::clone(&in_flight);
            let completed = Arc::clone(&completed);
            tokio::spawn(async move {
                debug!(?schedule, "save task started");
                loop {
                    run_save(&backend, &in_flight, &completed);
                    let delay = schedule.next_delay();
                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = stop.notified() => break,
                    }
                }
                debug!("save task stopped");
            })
        };

        Self {
            backend,
            stop,
            in_flight,
            completed,
            handle: Some(handle),
        }
    }

    /// Number of scheduled saves that finished successfully.
    pub fn completed_saves(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Stops the timer, waits for the task to finish, then saves one last time
    /// if the directory was ever loaded.
    pub async fn shutdown(mut self) -> Result<()> {
        self.stop.notify_one();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "save task ended abnormally");
            }
        }
        let backend = self.backend.lock();
        if !backend.is_loaded() {
            debug!("directory never loaded, skipping final save");
            return Ok(());
        }
        backend.save()?;
        info!("final save complete");
        Ok(())
    }
}

impl Drop for SaveScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

fn run_save(backend: &Mutex<DirectoryBackend>, in_flight: &AtomicBool, completed: &AtomicUsize) {
    if in_flight.swap(true, Ordering::SeqCst) {
        debug!("previous save still running, skipping");
        return;
    }
    let backend = backend.lock();
    if !backend.is_loaded() {
        debug!("directory not loaded yet, skipping save");
    } else if let Err(err) = backend.save() {
        warn!(error = %err, "periodic save failed, retrying next cycle");
    } else {
        completed.fetch_add(1, Ordering::SeqCst);
    }
    in_flight.store(false, Ordering::SeqCst);
}
