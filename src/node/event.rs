//! Node change notifications.
//!
//! Observers receive events over channels instead of in-call-stack callbacks.
//! Events are sent synchronously, in mutation order, before the mutating call
//! returns; the receiving side drains them when it is ready.

use crate::node::property::{PropId, Property};
use crate::types::NodeId;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};

/// A change observed on a watched node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// `child` was appended to `parent`'s children.
    ChildAdded { parent: NodeId, child: NodeId },
    /// `child` was removed from `parent`; `index` is its former position.
    ChildRemoved {
        parent: NodeId,
        child: NodeId,
        index: usize,
    },
    /// A property of `child` changed while it sat under `parent`.
    ChildChanged {
        parent: NodeId,
        child: NodeId,
        prop: PropId,
    },
    /// The node's reference count reached zero. Carries its final properties,
    /// since the id no longer resolves once this is delivered.
    Destroyed {
        node: NodeId,
        properties: Vec<Property>,
    },
}

/// Per-node and database-wide subscriber lists.
#[derive(Default)]
pub(crate) struct Observers {
    per_node: HashMap<NodeId, Vec<Sender<NodeEvent>>>,
    destroyed: Vec<Sender<NodeEvent>>,
}

impl Observers {
    pub(crate) fn watch(&mut self, node: NodeId) -> Receiver<NodeEvent> {
        let (tx, rx) = channel();
        self.per_node.entry(node).or_default().push(tx);
        rx
    }

    pub(crate) fn watch_destroyed(&mut self) -> Receiver<NodeEvent> {
        let (tx, rx) = channel();
        self.destroyed.push(tx);
        rx
    }

    /// Delivers `event` to every observer of `node`, dropping observers whose
    /// receiver has gone away.
    pub(crate) fn emit(&mut self, node: NodeId, event: NodeEvent) {
        if let Some(senders) = self.per_node.get_mut(&node) {
            senders.retain(|tx| tx.send(event.clone()).is_ok());
            if senders.is_empty() {
                self.per_node.remove(&node);
            }
        }
    }

    /// Delivers a destroy notification to the node's own observers and to the
    /// database-wide destroy subscribers, then forgets the node's observers.
    pub(crate) fn emit_destroyed(&mut self, node: NodeId, event: NodeEvent) {
        self.emit(node, event.clone());
        self.per_node.remove(&node);
        self.destroyed.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
