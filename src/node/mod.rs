//! Node graph store
//!
//! A `NodeDatabase` owns every `Node` by id. Edges are ids, never owning
//! pointers, so parent/child cycles and back-references cost nothing to tear
//! down. Nodes are reference counted; when a count reaches zero the node is
//! unlinked from its parents and children, dropped from the id map, and a
//! `NodeEvent::Destroyed` is delivered to subscribers.

pub mod event;
pub mod property;
pub mod snapshot;

pub use event::NodeEvent;
pub use property::{PropId, Property, ValueKind};
pub use snapshot::{FrozenChildren, FrozenNode};

use crate::error::NodeError;
use crate::types::NodeId;
use event::Observers;
use snapshot::FreezeCounter;
use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc::Receiver;
use tracing::debug;

/// A graph vertex: typed properties plus ordered children.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    properties: BTreeMap<PropId, Property>,
    children: Vec<NodeId>,
    parents: Vec<NodeId>,
    ref_count: usize,
    freezes: FreezeCounter,
}

impl Node {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            properties: BTreeMap::new(),
            children: Vec::new(),
            parents: Vec::new(),
            ref_count: 1,
            freezes: FreezeCounter::default(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Raw accessor: `None` when the property was never set.
    pub fn property(&self, prop: PropId) -> Option<&Property> {
        self.properties.get(&prop)
    }

    /// All set properties, ordered by id.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// Typed read that reports an unset property as an error.
    pub fn get_property(&self, prop: PropId) -> Result<&Property, NodeError> {
        self.properties.get(&prop).ok_or(NodeError::UnsetProperty {
            node: self.id,
            prop,
        })
    }

    pub fn string(&self, prop: PropId) -> Result<&str, NodeError> {
        self.get_property(prop)?
            .as_str()
            .ok_or(NodeError::WrongPropertyType {
                node: self.id,
                prop,
            })
    }

    /// Int and long properties, widened to i64.
    pub fn integer(&self, prop: PropId) -> Result<i64, NodeError> {
        self.get_property(prop)?
            .as_i64()
            .ok_or(NodeError::WrongPropertyType {
                node: self.id,
                prop,
            })
    }

    pub fn boolean(&self, prop: PropId) -> Result<bool, NodeError> {
        self.get_property(prop)?
            .as_bool()
            .ok_or(NodeError::WrongPropertyType {
                node: self.id,
                prop,
            })
    }

    pub fn node_ref(&self, prop: PropId) -> Result<NodeId, NodeError> {
        self.get_property(prop)?
            .as_node()
            .ok_or(NodeError::WrongPropertyType {
                node: self.id,
                prop,
            })
    }

    pub fn list(&self, prop: PropId) -> Result<&[String], NodeError> {
        self.get_property(prop)?
            .as_list()
            .ok_or(NodeError::WrongPropertyType {
                node: self.id,
                prop,
            })
    }

    /// Display name, or the empty string for unnamed nodes.
    pub fn name(&self) -> &str {
        self.string(PropId::Name).unwrap_or("")
    }

    /// Live child list. Use `NodeDatabase::freeze` for a copy that survives
    /// mutation.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    pub fn ref_count(&self) -> usize {
        self.ref_count
    }

    pub fn is_frozen(&self) -> bool {
        self.freezes.count() > 0
    }
}

/// Registry and allocator for a family of related nodes.
pub struct NodeDatabase {
    name: String,
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
    observers: Observers,
}

impl NodeDatabase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: HashMap::new(),
            next_id: 0,
            observers: Observers::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Creates a node with a fresh id and a reference count of one.
    pub fn create(&mut self) -> NodeId {
        while self.nodes.contains_key(&NodeId(self.next_id)) {
            self.next_id += 1;
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(id));
        id
    }

    /// Creates a node with a reserved id. The allocator moves past it so that
    /// later `create` calls never collide.
    pub fn create_with_id(&mut self, id: NodeId) -> Result<NodeId, NodeError> {
        if self.nodes.contains_key(&id) {
            return Err(NodeError::IdInUse(id));
        }
        self.nodes.insert(id, Node::new(id));
        if id.0 >= self.next_id {
            self.next_id = id.0 + 1;
        }
        Ok(id)
    }

    pub fn get(&self, id: NodeId) -> Result<&Node, NodeError> {
        self.nodes.get(&id).ok_or(NodeError::NotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, NodeError> {
        self.nodes.get_mut(&id).ok_or(NodeError::NotFound(id))
    }

    /// Ids of every live node, ascending.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Increments the reference count and returns the new value.
    pub fn ref_node(&mut self, id: NodeId) -> Result<usize, NodeError> {
        let node = self.get_mut(id)?;
        node.ref_count += 1;
        Ok(node.ref_count)
    }

    /// Decrements the reference count and returns the new value. At zero the
    /// node is destroyed.
    pub fn unref(&mut self, id: NodeId) -> Result<usize, NodeError> {
        let node = self.get_mut(id)?;
        node.ref_count = node.ref_count.saturating_sub(1);
        let remaining = node.ref_count;
        if remaining == 0 {
            self.destroy(id);
        }
        Ok(remaining)
    }

    fn destroy(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        debug!(node = %id, db = %self.name, "destroying node");

        for parent in &node.parents {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                if let Some(index) = parent_node.children.iter().position(|c| *c == id) {
                    parent_node.children.remove(index);
                    self.observers.emit(
                        *parent,
                        NodeEvent::ChildRemoved {
                            parent: *parent,
                            child: id,
                            index,
                        },
                    );
                }
            }
        }
        for child in &node.children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parents.retain(|p| *p != id);
            }
        }

        let properties = node.properties.into_values().collect();
        self.observers
            .emit_destroyed(id, NodeEvent::Destroyed { node: id, properties });
    }

    /// Sets a property and notifies observers of each parent.
    pub fn set_property(&mut self, id: NodeId, property: Property) -> Result<(), NodeError> {
        let prop = property.id();
        let node = self.get_mut(id)?;
        node.properties.insert(prop, property);
        let parents = node.parents.clone();
        for parent in parents {
            self.observers.emit(
                parent,
                NodeEvent::ChildChanged {
                    parent,
                    child: id,
                    prop,
                },
            );
        }
        Ok(())
    }

    /// Removes a property, returning its old value.
    pub fn unset_property(
        &mut self,
        id: NodeId,
        prop: PropId,
    ) -> Result<Option<Property>, NodeError> {
        Ok(self.get_mut(id)?.properties.remove(&prop))
    }

    /// Typed read; an unset property is reported as `NodeError::UnsetProperty`.
    pub fn get_property(&self, id: NodeId, prop: PropId) -> Result<&Property, NodeError> {
        self.get(id)?.get_property(prop)
    }

    /// Appends `child` to `parent`. Linking an existing child again is a no-op.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.get(child)?;
        let parent_node = self.get_mut(parent)?;
        if parent_node.children.contains(&child) {
            return Ok(());
        }
        parent_node.children.push(child);
        self.get_mut(child)?.parents.push(parent);
        self.observers
            .emit(parent, NodeEvent::ChildAdded { parent, child });
        Ok(())
    }

    /// Unlinks `child` from `parent`. Returns false when it was not a child.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, NodeError> {
        let parent_node = self.get_mut(parent)?;
        let Some(index) = parent_node.children.iter().position(|c| *c == child) else {
            return Ok(false);
        };
        parent_node.children.remove(index);
        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parents.retain(|p| *p != parent);
        }
        self.observers.emit(
            parent,
            NodeEvent::ChildRemoved {
                parent,
                child,
                index,
            },
        );
        Ok(true)
    }

    pub fn has_child(&self, parent: NodeId, child: NodeId) -> bool {
        self.nodes
            .get(&parent)
            .map(|p| p.children.contains(&child))
            .unwrap_or(false)
    }

    pub fn children_len(&self, id: NodeId) -> Result<usize, NodeError> {
        Ok(self.get(id)?.children.len())
    }

    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.nodes
            .get(&parent)
            .and_then(|p| p.children.iter().position(|c| *c == child))
    }

    /// Copies the current children into a guard. The copy stays valid while
    /// the live list is mutated; dropping the guard thaws the node.
    pub fn freeze(&self, id: NodeId) -> Result<FrozenChildren, NodeError> {
        let node = self.get(id)?;
        Ok(FrozenChildren::new(
            id,
            node.children.clone(),
            node.freezes.acquire(),
        ))
    }

    /// Pins a single node.
    pub fn freeze_node(&self, id: NodeId) -> Result<FrozenNode, NodeError> {
        let node = self.get(id)?;
        Ok(FrozenNode::new(id, node.freezes.acquire()))
    }

    pub fn is_frozen(&self, id: NodeId) -> bool {
        self.nodes.get(&id).map(Node::is_frozen).unwrap_or(false)
    }

    /// Subscribes to child-added/removed/changed and destroy events on `id`.
    pub fn watch(&mut self, id: NodeId) -> Result<Receiver<NodeEvent>, NodeError> {
        self.get(id)?;
        Ok(self.observers.watch(id))
    }

    /// Subscribes to destroy events for every node in the database.
    pub fn watch_destroyed(&mut self) -> Receiver<NodeEvent> {
        self.observers.watch_destroyed()
    }

    /// Bumps the play count and stamps the last-played time with `now`.
    pub fn update_play_statistics(
        &mut self,
        id: NodeId,
        now: chrono::DateTime<chrono::Local>,
    ) -> Result<(), NodeError> {
        let plays = match self.get(id)?.property(PropId::PlayCount) {
            Some(p) => p.as_i64().unwrap_or(0),
            None => 0,
        };
        let plays = i32::try_from(plays + 1).unwrap_or(i32::MAX);
        self.set_property(id, Property::PlayCount(plays))?;
        self.set_property(id, Property::LastPlayed(now.timestamp()))?;
        self.set_property(
            id,
            Property::LastPlayedStr(now.format("%Y-%m-%d %H:%M").to_string()),
        )
    }
}
