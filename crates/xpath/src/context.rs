//! Request-scoped bookkeeping and caches.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;
use yangval_core::{Element, FilterNode, ModelNodeId, SchemaPath};

/// Identity-check cache key: the leaf type's base, the identity named in the
/// expression, the candidate leaf value and whether the base itself counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct IdentityKey {
    pub base: String,
    pub expected: String,
    pub candidate: String,
    pub include_self: bool,
}

/// Counters of a suspended `count()` walk.
#[derive(Debug, Default)]
pub(crate) struct CountWalk {
    visited: HashSet<ModelNodeId>,
    step_counts: HashMap<String, usize>,
}

type Decisions = BTreeMap<ModelNodeId, BTreeSet<SchemaPath>>;

/// State owned by one validation request.
///
/// Holds the create/delete/merge decisions produced by `when` evaluation and
/// the caches that are only valid while the configuration tree stays the
/// same. Create one per request, pass it by `&mut` to every entry point and
/// drop it (or [`reset`](Self::reset) it) when the request ends.
#[derive(Debug, Default)]
pub struct ValidationContext {
    to_create: Decisions,
    to_delete: Decisions,
    to_merge: Decisions,
    defaults: BTreeMap<ModelNodeId, BTreeMap<SchemaPath, String>>,
    identities: HashMap<IdentityKey, bool>,
    step_counts: HashMap<String, usize>,
    count_memo: HashMap<(ModelNodeId, String), usize>,
    visited: HashSet<ModelNodeId>,
    state_namespace: Option<String>,
    state_snapshots: HashMap<(ModelNodeId, FilterNode), Vec<Element>>,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every decision and cache.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn record_create(&mut self, parent: &ModelNodeId, path: &SchemaPath) {
        debug!(parent = %parent, path = %path, "when: node to create");
        self.to_create.entry(parent.clone()).or_default().insert(path.clone());
    }

    pub fn record_delete(&mut self, parent: &ModelNodeId, path: &SchemaPath) {
        debug!(parent = %parent, path = %path, "when: node to delete");
        self.to_delete.entry(parent.clone()).or_default().insert(path.clone());
    }

    pub fn record_merge(&mut self, parent: &ModelNodeId, path: &SchemaPath) {
        debug!(parent = %parent, path = %path, "when: node to merge");
        self.to_merge.entry(parent.clone()).or_default().insert(path.clone());
    }

    pub fn record_default(&mut self, parent: &ModelNodeId, path: &SchemaPath, value: &str) {
        self.defaults.entry(parent.clone()).or_default().insert(path.clone(), value.to_owned());
    }

    pub fn nodes_to_create(&self) -> &BTreeMap<ModelNodeId, BTreeSet<SchemaPath>> {
        &self.to_create
    }

    pub fn nodes_to_delete(&self) -> &BTreeMap<ModelNodeId, BTreeSet<SchemaPath>> {
        &self.to_delete
    }

    pub fn nodes_to_merge(&self) -> &BTreeMap<ModelNodeId, BTreeSet<SchemaPath>> {
        &self.to_merge
    }

    pub fn is_marked_for_create(&self, parent: &ModelNodeId, path: &SchemaPath) -> bool {
        self.to_create.get(parent).is_some_and(|paths| paths.contains(path))
    }

    pub fn is_marked_for_delete(&self, parent: &ModelNodeId, path: &SchemaPath) -> bool {
        self.to_delete.get(parent).is_some_and(|paths| paths.contains(path))
    }

    pub fn is_marked_for_merge(&self, parent: &ModelNodeId, path: &SchemaPath) -> bool {
        self.to_merge.get(parent).is_some_and(|paths| paths.contains(path))
    }

    pub fn default_for(&self, parent: &ModelNodeId, path: &SchemaPath) -> Option<&str> {
        self.defaults.get(parent)?.get(path).map(String::as_str)
    }

    /// Namespace whose prefix the normalizer adds to unqualified steps while a
    /// state-data pass is running.
    pub fn set_state_namespace(&mut self, namespace: impl Into<String>) {
        self.state_namespace = Some(namespace.into());
    }

    pub fn clear_state_namespace(&mut self) {
        self.state_namespace = None;
    }

    pub fn state_namespace(&self) -> Option<&str> {
        self.state_namespace.as_deref()
    }

    /// Number of memoized `count()` results.
    pub fn count_cache_len(&self) -> usize {
        self.count_memo.len()
    }

    pub fn identity_cache_len(&self) -> usize {
        self.identities.len()
    }

    pub fn state_snapshot_count(&self) -> usize {
        self.state_snapshots.len()
    }

    pub(crate) fn identity_result(&self, key: &IdentityKey) -> Option<bool> {
        self.identities.get(key).copied()
    }

    /// Append-only: a recorded result is never replaced.
    pub(crate) fn record_identity(&mut self, key: IdentityKey, result: bool) -> bool {
        *self.identities.entry(key).or_insert(result)
    }

    /// Starts a walk with empty counters. Returns the state of the walk
    /// already in progress, if any, for [`end_count_walk`](Self::end_count_walk).
    pub(crate) fn begin_count_walk(&mut self) -> CountWalk {
        CountWalk {
            visited: std::mem::take(&mut self.visited),
            step_counts: std::mem::take(&mut self.step_counts),
        }
    }

    pub(crate) fn end_count_walk(&mut self, outer: CountWalk) {
        self.visited = outer.visited;
        self.step_counts = outer.step_counts;
    }

    /// Marks `id` as counted; false if the walk already saw it.
    pub(crate) fn visit(&mut self, id: ModelNodeId) -> bool {
        self.visited.insert(id)
    }

    pub(crate) fn bump_step_count(&mut self, step: &str) {
        *self.step_counts.entry(step.to_owned()).or_insert(0) += 1;
    }

    /// Reads and clears the counter of `step`.
    pub(crate) fn take_step_count(&mut self, step: &str) -> usize {
        self.step_counts.remove(step).unwrap_or(0)
    }

    pub(crate) fn memoized_count(&self, start: &ModelNodeId, path: &str) -> Option<usize> {
        self.count_memo.get(&(start.clone(), path.to_owned())).copied()
    }

    pub(crate) fn memoize_count(&mut self, start: ModelNodeId, path: String, count: usize) {
        self.count_memo.insert((start, path), count);
    }

    pub(crate) fn state_snapshot(&self, anchor: &ModelNodeId, filter: &FilterNode) -> Option<&[Element]> {
        self.state_snapshots.get(&(anchor.clone(), filter.clone())).map(Vec::as_slice)
    }

    pub(crate) fn store_state_snapshot(&mut self, anchor: ModelNodeId, filter: FilterNode, elements: Vec<Element>) {
        self.state_snapshots.insert((anchor, filter), elements);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use yangval_core::{IdSegment, QName};

    fn id(name: &str) -> ModelNodeId {
        ModelNodeId::root().child(IdSegment::new(QName::new("urn:ex", name)))
    }

    #[rstest]
    fn identity_results_are_append_only() {
        let mut ctx = ValidationContext::new();
        let key = IdentityKey {
            base: "ex:iface-type".into(),
            expected: "ex:base-type".into(),
            candidate: "ex:eth".into(),
            include_self: false,
        };
        assert!(ctx.record_identity(key.clone(), true));
        assert!(ctx.record_identity(key.clone(), false));
        assert_eq!(ctx.identity_result(&key), Some(true));
    }

    #[rstest]
    fn step_counter_is_cleared_on_read() {
        let mut ctx = ValidationContext::new();
        ctx.bump_step_count("item");
        ctx.bump_step_count("item");
        assert_eq!(ctx.take_step_count("item"), 2);
        assert_eq!(ctx.take_step_count("item"), 0);
    }

    #[rstest]
    fn inner_walk_leaves_outer_counters_alone() {
        let mut ctx = ValidationContext::new();
        let _ = ctx.begin_count_walk();
        assert!(ctx.visit(id("a")));
        ctx.bump_step_count("c");

        let outer = ctx.begin_count_walk();
        assert!(ctx.visit(id("a")));
        ctx.bump_step_count("c");
        assert_eq!(ctx.take_step_count("c"), 1);
        ctx.end_count_walk(outer);

        assert!(!ctx.visit(id("a")));
        assert_eq!(ctx.take_step_count("c"), 1);
    }

    #[rstest]
    fn reset_discards_decisions_and_caches() {
        let mut ctx = ValidationContext::new();
        let path = SchemaPath::root().child(QName::new("urn:ex", "b"));
        ctx.record_create(&id("A"), &path);
        ctx.memoize_count(id("A"), "../x".into(), 3);
        ctx.set_state_namespace("urn:ex");
        ctx.reset();
        assert!(!ctx.is_marked_for_create(&id("A"), &path));
        assert_eq!(ctx.count_cache_len(), 0);
        assert_eq!(ctx.state_namespace(), None);
    }
}
