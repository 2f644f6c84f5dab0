//! Default file locations.

use std::path::PathBuf;

/// File name of the snapshot, tagged with the format version it holds.
pub const DB_FILE_NAME: &str = "iradio-2.2.xml";

/// Data directory for the directory snapshot.
///
/// Uses the platform data directory from `ProjectDirs`, falling back to
/// `$XDG_DATA_HOME/stationdb` and then `$HOME/.local/share/stationdb`.
pub fn data_dir() -> Option<PathBuf> {
    if let Some(dirs) = directories::ProjectDirs::from("", "", "stationdb") {
        return Some(dirs.data_dir().to_path_buf());
    }
    data_home().map(|home| home.join("stationdb"))
}

/// `$XDG_DATA_HOME`, or `$HOME/.local/share`.
pub fn data_home() -> Option<PathBuf> {
    if let Ok(xdg_data_home) = std::env::var("XDG_DATA_HOME") {
        if !xdg_data_home.is_empty() {
            return Some(PathBuf::from(xdg_data_home));
        }
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local").join("share"))
}

/// Default snapshot path. Falls back to the working directory when no data
/// directory can be determined.
pub fn default_db_file() -> PathBuf {
    data_dir()
        .map(|dir| dir.join(DB_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DB_FILE_NAME))
}
