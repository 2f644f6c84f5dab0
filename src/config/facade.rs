//! ConfigLoader: merges defaults, an optional file and the environment.

use super::DirectoryConfig;
use crate::error::Result;
use config::{Config, Environment, File};
use std::path::Path;
use tracing::debug;

/// Prefix of environment overrides, e.g. `STATIONDB__SAVE_INTERVAL_SECS`.
pub const ENV_PREFIX: &str = "STATIONDB";

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration. Precedence: defaults (lowest) -> `path` -> environment (highest).
    pub fn load(path: Option<&Path>) -> Result<DirectoryConfig> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "reading config file");
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Create default configuration.
    pub fn default() -> DirectoryConfig {
        DirectoryConfig::default()
    }
}
