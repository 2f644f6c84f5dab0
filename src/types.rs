//! Core types for the station directory node store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// NodeId: process-unique identifier assigned once by a `NodeDatabase`
///
/// Ids are never reused inside one database, so a stale id can only ever
/// resolve to "not found", never to an unrelated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        NodeId(value)
    }
}
