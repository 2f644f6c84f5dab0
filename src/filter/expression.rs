//! Filter predicates over nodes.

use super::collate::{case_fold, sort_key};
use crate::node::{NodeDatabase, PropId};
use crate::types::NodeId;

/// Discriminant naming each predicate kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionKind {
    AlwaysTrue,
    NodeEquals,
    Equals,
    HasParent,
    HasChild,
    NodePropertyEquals,
    StringPropertyContains,
    StringPropertyEquals,
    KeyPropertyContains,
    KeyPropertyEquals,
    IntPropertyEquals,
    IntPropertyGreater,
    IntPropertyLess,
}

/// Arguments accepted by [`NodeFilterExpression::new`].
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Node(NodeId),
    Nodes(NodeId, NodeId),
    NodeProperty(PropId, NodeId),
    StringProperty(PropId, String),
    IntProperty(PropId, i64),
}

/// An immutable predicate. String operands are folded (and keyed) once at
/// construction so evaluation does no per-call allocation on the operand side.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeFilterExpression {
    AlwaysTrue,
    /// Compares two fixed nodes, ignoring the evaluated node.
    NodeEquals(NodeId, NodeId),
    /// The evaluated node is this node.
    Equals(NodeId),
    /// The evaluated node is a child of this node.
    HasParent(NodeId),
    /// The evaluated node has this node as a child.
    HasChild(NodeId),
    NodePropertyEquals { prop: PropId, node: NodeId },
    StringPropertyContains { prop: PropId, folded: String },
    StringPropertyEquals { prop: PropId, folded: String },
    KeyPropertyContains { prop: PropId, key: String },
    KeyPropertyEquals { prop: PropId, key: String },
    IntPropertyEquals { prop: PropId, value: i64 },
    IntPropertyGreater { prop: PropId, value: i64 },
    IntPropertyLess { prop: PropId, value: i64 },
}

impl NodeFilterExpression {
    /// Builds an expression from a discriminant and its operand. Returns `None`
    /// when the operand does not fit the kind.
    pub fn new(kind: ExpressionKind, operand: Operand) -> Option<Self> {
        use ExpressionKind as K;
        let expr = match (kind, operand) {
            (K::AlwaysTrue, Operand::None) => Self::AlwaysTrue,
            (K::NodeEquals, Operand::Nodes(a, b)) => Self::NodeEquals(a, b),
            (K::Equals, Operand::Node(n)) => Self::Equals(n),
            (K::HasParent, Operand::Node(n)) => Self::HasParent(n),
            (K::HasChild, Operand::Node(n)) => Self::HasChild(n),
            (K::NodePropertyEquals, Operand::NodeProperty(prop, node)) => {
                Self::NodePropertyEquals { prop, node }
            }
            (K::StringPropertyContains, Operand::StringProperty(prop, s)) => {
                Self::string_contains(prop, &s)
            }
            (K::StringPropertyEquals, Operand::StringProperty(prop, s)) => {
                Self::string_equals(prop, &s)
            }
            (K::KeyPropertyContains, Operand::StringProperty(prop, s)) => {
                Self::key_contains(prop, &s)
            }
            (K::KeyPropertyEquals, Operand::StringProperty(prop, s)) => Self::key_equals(prop, &s),
            (K::IntPropertyEquals, Operand::IntProperty(prop, value)) => {
                Self::IntPropertyEquals { prop, value }
            }
            (K::IntPropertyGreater, Operand::IntProperty(prop, value)) => {
                Self::IntPropertyGreater { prop, value }
            }
            (K::IntPropertyLess, Operand::IntProperty(prop, value)) => {
                Self::IntPropertyLess { prop, value }
            }
            _ => return None,
        };
        Some(expr)
    }

    pub fn string_contains(prop: PropId, text: &str) -> Self {
        Self::StringPropertyContains {
            prop,
            folded: case_fold(text),
        }
    }

    pub fn string_equals(prop: PropId, text: &str) -> Self {
        Self::StringPropertyEquals {
            prop,
            folded: case_fold(text),
        }
    }

    /// Matches against a property that already holds a collation key
    /// (e.g. `NameSortKey`).
    pub fn key_contains(prop: PropId, text: &str) -> Self {
        Self::KeyPropertyContains {
            prop,
            key: sort_key(text),
        }
    }

    pub fn key_equals(prop: PropId, text: &str) -> Self {
        Self::KeyPropertyEquals {
            prop,
            key: sort_key(text),
        }
    }

    pub fn kind(&self) -> ExpressionKind {
        use ExpressionKind as K;
        match self {
            Self::AlwaysTrue => K::AlwaysTrue,
            Self::NodeEquals(..) => K::NodeEquals,
            Self::Equals(_) => K::Equals,
            Self::HasParent(_) => K::HasParent,
            Self::HasChild(_) => K::HasChild,
            Self::NodePropertyEquals { .. } => K::NodePropertyEquals,
            Self::StringPropertyContains { .. } => K::StringPropertyContains,
            Self::StringPropertyEquals { .. } => K::StringPropertyEquals,
            Self::KeyPropertyContains { .. } => K::KeyPropertyContains,
            Self::KeyPropertyEquals { .. } => K::KeyPropertyEquals,
            Self::IntPropertyEquals { .. } => K::IntPropertyEquals,
            Self::IntPropertyGreater { .. } => K::IntPropertyGreater,
            Self::IntPropertyLess { .. } => K::IntPropertyLess,
        }
    }

    /// Evaluates the predicate for `node`. Missing nodes and unset or
    /// mistyped properties never match.
    pub fn evaluate(&self, db: &NodeDatabase, node: NodeId) -> bool {
        match self {
            Self::AlwaysTrue => true,
            Self::NodeEquals(a, b) => a == b,
            Self::Equals(n) => *n == node,
            Self::HasParent(parent) => db.has_child(*parent, node),
            Self::HasChild(child) => db.has_child(node, *child),
            Self::NodePropertyEquals { prop, node: want } => {
                property(db, node, *prop).and_then(|p| p.as_node()) == Some(*want)
            }
            Self::StringPropertyContains { prop, folded } => string_prop(db, node, *prop)
                .map(|s| case_fold(s).contains(folded.as_str()))
                .unwrap_or(false),
            Self::StringPropertyEquals { prop, folded } => string_prop(db, node, *prop)
                .map(|s| case_fold(s) == *folded)
                .unwrap_or(false),
            Self::KeyPropertyContains { prop, key } => string_prop(db, node, *prop)
                .map(|s| s.contains(key.as_str()))
                .unwrap_or(false),
            Self::KeyPropertyEquals { prop, key } => string_prop(db, node, *prop)
                .map(|s| s == key)
                .unwrap_or(false),
            Self::IntPropertyEquals { prop, value } => int_prop(db, node, *prop) == Some(*value),
            Self::IntPropertyGreater { prop, value } => {
                int_prop(db, node, *prop).map(|v| v > *value).unwrap_or(false)
            }
            Self::IntPropertyLess { prop, value } => {
                int_prop(db, node, *prop).map(|v| v < *value).unwrap_or(false)
            }
        }
    }
}

fn property(db: &NodeDatabase, node: NodeId, prop: PropId) -> Option<&crate::node::Property> {
    db.get(node).ok().and_then(|n| n.property(prop))
}

fn string_prop(db: &NodeDatabase, node: NodeId, prop: PropId) -> Option<&str> {
    property(db, node, prop).and_then(|p| p.as_str())
}

fn int_prop(db: &NodeDatabase, node: NodeId, prop: PropId) -> Option<i64> {
    property(db, node, prop).and_then(|p| p.as_i64())
}
