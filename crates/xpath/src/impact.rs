//! Schema-wide index from referenced nodes to the constraints reading them.

use crate::access_path::{AccessPath, resolve_references};
use std::collections::BTreeMap;
use tracing::debug;
use yangval_core::{Expr, SchemaNavigator, SchemaNode, SchemaPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintKind {
    Must,
    When,
    LeafRef,
}

/// One constraint that must be re-checked when its target changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Impact {
    /// Node the constraint is declared on.
    pub owner: SchemaPath,
    pub kind: ConstraintKind,
    /// Path from the changed node back to `owner`.
    pub access_path: AccessPath,
}

#[derive(Debug, Default)]
pub struct ImpactIndex {
    by_target: BTreeMap<SchemaPath, Vec<Impact>>,
}

impl ImpactIndex {
    /// Walks the whole schema, choice and case nodes included, and indexes
    /// every `must`, `when` and leafref path.
    pub fn build(navigator: &dyn SchemaNavigator) -> Self {
        let mut index = Self::default();
        let mut pending = navigator.root_nodes();
        while let Some(node) = pending.pop() {
            for must in node.must() {
                index.add(navigator, &node, ConstraintKind::Must, must.expr());
            }
            if let Some(when) = node.when() {
                index.add(navigator, &node, ConstraintKind::When, when);
            }
            if let Some(path) = node.leaf_type().and_then(|leaf_type| leaf_type.leafref_path()) {
                index.add(navigator, &node, ConstraintKind::LeafRef, path);
            }
            pending.extend(navigator.children_of(node.path()));
        }
        debug!(targets = index.by_target.len(), impacts = index.len(), "impact index built");
        index
    }

    fn add(&mut self, navigator: &dyn SchemaNavigator, owner: &SchemaNode, kind: ConstraintKind, expr: &Expr) {
        for (target, paths) in resolve_references(navigator, owner, expr) {
            let impacts = self.by_target.entry(target).or_default();
            impacts.extend(paths.into_iter().map(|access_path| Impact { owner: owner.path().clone(), kind, access_path }));
        }
    }

    /// Constraints to re-check when the node at `target` changes.
    pub fn impacted_by(&self, target: &SchemaPath) -> &[Impact] {
        self.by_target.get(target).map_or(&[], Vec::as_slice)
    }

    pub fn targets(&self) -> impl Iterator<Item = &SchemaPath> {
        self.by_target.keys()
    }

    pub fn len(&self) -> usize {
        self.by_target.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}
