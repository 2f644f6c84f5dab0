//! Configuration
//!
//! `DirectoryConfig` is assembled from built-in defaults, an optional config
//! file and `STATIONDB__*` environment variables, in that order of precedence.

pub mod facade;
pub mod paths;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for the station directory and its background save task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Snapshot file (default: `<data dir>/iradio-2.2.xml`)
    #[serde(default = "paths::default_db_file")]
    pub db_file: PathBuf,

    /// Seed file used instead of the bundled station list
    #[serde(default)]
    pub seed_file: Option<PathBuf>,

    #[serde(default = "default_save_interval_secs")]
    pub save_interval_secs: u64,

    /// Upper bound of the random delay added to each save interval
    #[serde(default = "default_save_jitter_secs")]
    pub save_jitter_secs: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_save_interval_secs() -> u64 {
    60
}

fn default_save_jitter_secs() -> u64 {
    15
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            db_file: paths::default_db_file(),
            seed_file: None,
            save_interval_secs: default_save_interval_secs(),
            save_jitter_secs: default_save_jitter_secs(),
            logging: LoggingConfig::default(),
        }
    }
}
