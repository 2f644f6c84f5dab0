//! Scoped freeze guards.
//!
//! Freezing hands out a stable copy of a node's children (or pins a single
//! node) and thaws automatically when the guard is dropped, on every exit path.

use crate::types::NodeId;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared freeze counter attached to every node.
#[derive(Debug, Clone, Default)]
pub(crate) struct FreezeCounter(Arc<AtomicUsize>);

impl FreezeCounter {
    pub(crate) fn acquire(&self) -> FreezeToken {
        self.0.fetch_add(1, Ordering::AcqRel);
        FreezeToken(self.0.clone())
    }

    pub(crate) fn count(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}

/// One outstanding freeze; releasing it is the thaw.
#[derive(Debug)]
pub(crate) struct FreezeToken(Arc<AtomicUsize>);

impl Drop for FreezeToken {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Stable copy of a node's children, independent of later mutation.
#[derive(Debug)]
pub struct FrozenChildren {
    node: NodeId,
    children: Vec<NodeId>,
    _token: FreezeToken,
}

impl FrozenChildren {
    pub(crate) fn new(node: NodeId, children: Vec<NodeId>, token: FreezeToken) -> Self {
        Self {
            node,
            children,
            _token: token,
        }
    }

    /// The node whose children were frozen.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Releases the freeze. Dropping the guard does the same.
    pub fn thaw(self) {}
}

impl Deref for FrozenChildren {
    type Target = [NodeId];

    fn deref(&self) -> &[NodeId] {
        &self.children
    }
}

/// A single node pinned by a lookup. The caller thaws it by dropping it.
#[derive(Debug)]
pub struct FrozenNode {
    id: NodeId,
    _token: FreezeToken,
}

impl FrozenNode {
    pub(crate) fn new(id: NodeId, token: FreezeToken) -> Self {
        Self { id, _token: token }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn thaw(self) -> NodeId {
        self.id
    }
}
