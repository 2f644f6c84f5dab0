//! Multi-level node filter
//!
//! A filter is an ordered list of levels; each level is a list of expressions.
//! A level passes when any of its expressions is true, and the filter passes
//! when every level passes. Levels AND independent criteria ("in this genre"
//! AND "matches the search text") while a single level expresses one
//! criterion as a disjunction ("in any of these genres").

pub mod collate;
pub mod expression;

pub use expression::{ExpressionKind, NodeFilterExpression, Operand};

use crate::error::NodeError;
use crate::node::NodeDatabase;
use crate::types::NodeId;

/// Levelled AND-of-ORs predicate. Zero levels matches everything.
#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    levels: Vec<Vec<NodeFilterExpression>>,
    revision: u64,
}

impl NodeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `expr` to `level`, growing the level list as needed. Levels
    /// skipped over stay empty and therefore never match.
    pub fn add_expression(&mut self, expr: NodeFilterExpression, level: usize) {
        if self.levels.len() <= level {
            self.levels.resize_with(level + 1, Vec::new);
        }
        self.levels[level].push(expr);
        self.revision += 1;
    }

    /// Drops every expression; the filter matches everything again.
    pub fn empty(&mut self) {
        self.levels.clear();
        self.revision += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, level: usize) -> Option<&[NodeFilterExpression]> {
        self.levels.get(level).map(Vec::as_slice)
    }

    /// Counter bumped on every change, so live views know to re-evaluate.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn evaluate(&self, db: &NodeDatabase, node: NodeId) -> bool {
        self.levels
            .iter()
            .all(|level| level.iter().any(|expr| expr.evaluate(db, node)))
    }

    /// Children of `parent` that pass, in child order.
    pub fn apply(&self, db: &NodeDatabase, parent: NodeId) -> Result<Vec<NodeId>, NodeError> {
        let children = db.freeze(parent)?;
        Ok(children
            .iter()
            .copied()
            .filter(|child| self.evaluate(db, *child))
            .collect())
    }
}
