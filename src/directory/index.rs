//! Genre name index
//!
//! Maps display names to genre nodes. Lookups may come from another execution
//! context than the mutation path, so the map sits behind a reader-writer
//! lock: every read takes the read lock, every insert/remove takes the write
//! lock. Each write is applied atomically, so readers never see a partially
//! inserted genre.

use crate::types::NodeId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct IndexMaps {
    by_name: HashMap<String, NodeId>,
    by_id: HashMap<NodeId, String>,
}

/// Shared, clonable handle to the genre index.
#[derive(Clone, Default)]
pub struct GenreIndex {
    maps: Arc<RwLock<IndexMaps>>,
}

impl GenreIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.maps.read().by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.maps.read().by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.maps.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> Vec<String> {
        self.maps.read().by_name.keys().cloned().collect()
    }

    pub(crate) fn insert(&self, name: String, id: NodeId) {
        let mut maps = self.maps.write();
        if let Some(old) = maps.by_id.insert(id, name.clone()) {
            maps.by_name.remove(&old);
        }
        maps.by_name.insert(name, id);
    }

    /// Removes by node id; the node may already be destroyed, so its name is
    /// recovered from the reverse map.
    pub(crate) fn remove(&self, id: NodeId) -> Option<String> {
        let mut maps = self.maps.write();
        let name = maps.by_id.remove(&id)?;
        if maps.by_name.get(&name) == Some(&id) {
            maps.by_name.remove(&name);
        }
        Some(name)
    }

    pub(crate) fn clear(&self) {
        let mut maps = self.maps.write();
        maps.by_name.clear();
        maps.by_id.clear();
    }
}
