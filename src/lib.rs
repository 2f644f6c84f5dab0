//! stationdb: node-graph store and internet radio station directory
//!
//! Reference-counted graph nodes with typed properties (`node`), a levelled
//! boolean filter over them (`filter`), and a genre → station directory that
//! persists to a versioned XML snapshot (`directory`).

pub mod config;
pub mod directory;
pub mod error;
pub mod filter;
pub mod logging;
pub mod node;
pub mod tooling;
pub mod types;

pub use directory::{DirectoryBackend, DirectoryEvent, GenreIndex, LoadOutcome};
pub use error::{DirectoryError, NodeError, Result};
pub use filter::{NodeFilter, NodeFilterExpression};
pub use node::{NodeDatabase, NodeEvent, PropId, Property};
pub use types::NodeId;
