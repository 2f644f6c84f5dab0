//! Error types for the node store and the station directory.

use crate::node::PropId;
use crate::types::NodeId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the node database.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The id does not name a live node in this database.
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    /// `create_with_id` was asked for an id that is already live.
    #[error("Node id already in use: {0}")]
    IdInUse(NodeId),

    /// A typed read hit a property that was never set.
    #[error("Property {prop:?} is not set on node {node}")]
    UnsetProperty { node: NodeId, prop: PropId },

    /// A typed read asked for the wrong value kind.
    #[error("Property {prop:?} on node {node} has a different type")]
    WrongPropertyType { node: NodeId, prop: PropId },
}

/// Errors raised by the directory backend and its persistence layer.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The persisted snapshot or seed file is not well-formed.
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The persisted snapshot declares a format version we do not read.
    #[error("Invalid version {found:?} (expected {expected})")]
    VersionMismatch {
        found: Option<String>,
        expected: &'static str,
    },

    /// A seed station was closed before name, genre and a url were all seen.
    #[error("Incomplete station record: {0}")]
    IncompleteRecord(String),

    /// `add_station` was called without any location.
    #[error("A station needs at least one location")]
    EmptyLocations,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias that pins the error type to [`DirectoryError`].
pub type Result<T> = std::result::Result<T, DirectoryError>;

impl From<quick_xml::events::attributes::AttrError> for DirectoryError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        DirectoryError::Xml(quick_xml::Error::from(err))
    }
}

impl From<config::ConfigError> for DirectoryError {
    fn from(err: config::ConfigError) -> Self {
        DirectoryError::Config(err.to_string())
    }
}

impl DirectoryError {
    /// Returns a short, human-readable message suitable for a one-time diagnostic.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Parse { path, .. } => format!("Failed to parse {}", path.display()),
            Self::VersionMismatch { .. } => {
                "The station list was written by an incompatible version".to_string()
            }
            Self::IncompleteRecord(name) => format!("Skipped incomplete station {name}"),
            Self::EmptyLocations => "A station needs at least one location".to_string(),
            Self::Io(e) => format!("File error: {e}"),
            Self::Xml(e) => format!("Data format error: {e}"),
            Self::Node(e) => e.to_string(),
            Self::Config(msg) => format!("Configuration error: {msg}"),
        }
    }

    /// True for the failures that `load` recovers from by reseeding.
    pub fn is_recoverable_load_failure(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::VersionMismatch { .. } | Self::Xml(_)
        )
    }
}
