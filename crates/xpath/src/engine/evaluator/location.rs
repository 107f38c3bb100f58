use super::{EvalOutcome, Evaluator, Focus};
use crate::engine::{attribute_items, children_scope, navigator_for};
use crate::names::resolve_child;
use crate::value::{EvalResult, Item};
use itertools::Itertools;
use std::sync::Arc;
use tracing::{debug, trace};
use yangval_core::{
    Axis, Expr, LocationPath, NameTest, NodeRef, Scalar, SchemaNavigator, SchemaNodeRef, SchemaPath, Step,
    ValidationError,
};

/// Where an absolute path starts for a given anchor.
enum RootScope {
    /// Top-level node of the data tree the anchor lives in.
    Top(NodeRef),
    /// Mount point whose mounted schema contains the anchor.
    Mount(NodeRef),
}

impl Evaluator<'_> {
    pub(super) fn location_path(&mut self, path: &LocationPath, focus: &Focus) -> EvalOutcome {
        if focus.item.is_pending() && refers_to_current(path) {
            trace!(path = %path, "focus not created yet, current() reference treated as satisfied");
            return Ok(EvalResult::Bool(true));
        }
        if path.is_absolute() {
            let Some((first, rest)) = path.steps().split_first() else {
                return Ok(EvalResult::Absent);
            };
            return match self.absolute_start(first, rest, focus)? {
                Some(items) if items.is_empty() => Ok(EvalResult::NodeSet(items)),
                Some(items) => self.walk_steps(items, rest),
                None => Ok(EvalResult::Absent),
            };
        }
        self.walk_steps(vec![focus.item.clone()], path.steps())
    }

    /// Items selected by the first step of an absolute path, predicates
    /// applied. `None` when the step reaches nothing.
    pub(in crate::engine) fn absolute_start(
        &mut self,
        first: &Step,
        rest: &[Step],
        focus: &Focus,
    ) -> Result<Option<Vec<Item>>, ValidationError> {
        if first.axis() != Axis::Child {
            return Ok(None);
        }
        let candidates = match self.root_scope(focus.item.anchor()) {
            RootScope::Mount(mount) => self.axis_items(&Item::Node(mount), first, rest)?,
            RootScope::Top(top) => self.top_level(top, first.test())?,
        };
        match candidates {
            Some(items) => self.apply_predicates(items, first.predicates()).map(Some),
            None => Ok(None),
        }
    }

    fn top_level(&mut self, top: NodeRef, test: Option<&NameTest>) -> Result<Option<Vec<Item>>, ValidationError> {
        let Some(test) = test else {
            return Ok(Some(vec![Item::Node(top)]));
        };
        let navigator = Arc::clone(self.env.navigator);
        let Some(schema) = resolve_child(navigator.as_ref(), &SchemaPath::root(), test, &self.default_namespace) else {
            self.unresolved(format!("/{test}"))?;
            return Ok(None);
        };
        if *schema.name() == top.name() {
            return Ok(Some(vec![Item::Node(top)]));
        }
        let alternate = self.env.roots.and_then(|roots| roots.root(schema.name()));
        debug!(root = %schema.name(), found = alternate.is_some(), "absolute path leaves the current data tree");
        Ok(alternate.map(|root| vec![Item::Node(root)]))
    }

    fn root_scope(&self, anchor: &NodeRef) -> RootScope {
        let mut current = NodeRef::clone(anchor);
        while let Some(parent) = current.parent() {
            let navigator = navigator_for(self.env.navigator, &parent);
            if navigator.data_node_at(&parent.schema_path()).is_some_and(|node| node.is_mount_point()) {
                return RootScope::Mount(parent);
            }
            current = parent;
        }
        RootScope::Top(current)
    }

    /// Applies `steps` left to right. Navigation that finds nothing yields
    /// `Absent`; predicates that reject every candidate yield an empty set.
    pub(in crate::engine) fn walk_steps(&mut self, start: Vec<Item>, steps: &[Step]) -> EvalOutcome {
        let mut current = start;
        for (i, step) in steps.iter().enumerate() {
            let rest = &steps[i + 1..];
            let mut reached = false;
            let mut next = Vec::new();
            for item in &current {
                let Some(candidates) = self.axis_items(item, step, rest)? else {
                    continue;
                };
                reached = true;
                next.extend(self.apply_predicates(candidates, step.predicates())?);
            }
            if !reached {
                trace!(step = %step, "no data along step");
                return Ok(EvalResult::Absent);
            }
            if next.is_empty() {
                return Ok(EvalResult::NodeSet(next));
            }
            current = next.into_iter().unique_by(Item::id).collect();
        }
        Ok(EvalResult::NodeSet(current))
    }

    /// Items one step away from `item`. `None` when nothing exists there.
    pub(in crate::engine) fn axis_items(
        &mut self,
        item: &Item,
        step: &Step,
        rest: &[Step],
    ) -> Result<Option<Vec<Item>>, ValidationError> {
        match step.axis() {
            Axis::SelfNode => Ok(self.matches(item, step.test()).then(|| vec![item.clone()])),
            Axis::Parent => Ok(item
                .parent()
                .map(Item::Node)
                .filter(|parent| self.matches(parent, step.test()))
                .map(|parent| vec![parent])),
            Axis::Child => match item {
                Item::Node(node) => self.child_items(node, step.test(), rest),
                Item::Leaf { .. } | Item::Pending { .. } => Ok(None),
            },
        }
    }

    fn matches(&self, item: &Item, test: Option<&NameTest>) -> bool {
        let Some(test) = test else {
            return true;
        };
        let name = item.name();
        if name.local() != test.local.as_ref() {
            return false;
        }
        match &test.prefix {
            Some(prefix) => {
                let navigator = navigator_for(self.env.navigator, item.anchor());
                navigator.namespace_for(prefix).is_none_or(|namespace| namespace == name.namespace())
            }
            None => true,
        }
    }

    fn child_items(
        &mut self,
        node: &NodeRef,
        test: Option<&NameTest>,
        rest: &[Step],
    ) -> Result<Option<Vec<Item>>, ValidationError> {
        let (navigator, parent_path) = children_scope(self.env.navigator, node);
        let children: Vec<SchemaNodeRef> = match test {
            Some(test) => match resolve_child(navigator.as_ref(), &parent_path, test, &self.default_namespace) {
                Some(child) => vec![child],
                None => {
                    self.unresolved(format!("{parent_path}/{test}"))?;
                    return Ok(None);
                }
            },
            None => navigator.data_children_of(&parent_path),
        };
        let parent_is_config = parent_path.is_root()
            || navigator.data_node_at(&parent_path).is_none_or(|parent| parent.is_config());
        let mut items = Vec::new();
        for child in &children {
            if parent_is_config && !child.is_config() && self.env.state.is_some() {
                let rest = if test.is_some() { rest } else { &[] };
                items.extend(self.state_items(node, child, &navigator, rest)?);
            } else {
                items.extend(attribute_items(node, child.name()));
            }
        }
        Ok((!items.is_empty()).then_some(items))
    }

    /// Keeps the items every predicate accepts. A numeric predicate selects
    /// by position.
    pub(in crate::engine) fn apply_predicates(
        &mut self,
        mut items: Vec<Item>,
        predicates: &[Expr],
    ) -> Result<Vec<Item>, ValidationError> {
        for predicate in predicates {
            let size = items.len();
            let mut kept = Vec::with_capacity(size);
            for (index, item) in items.into_iter().enumerate() {
                let focus = Focus { item, position: index + 1, size };
                let keep = match self.eval(predicate, &focus)? {
                    EvalResult::Scalar(Scalar::Number(n)) => position_matches(n, focus.position),
                    other => other.to_bool(),
                };
                if keep {
                    kept.push(focus.item);
                }
            }
            items = kept;
        }
        Ok(items)
    }

    pub(in crate::engine) fn navigator(&self, node: &NodeRef) -> Arc<dyn SchemaNavigator> {
        navigator_for(self.env.navigator, node)
    }
}

#[allow(clippy::cast_precision_loss)]
fn position_matches(n: f64, position: usize) -> bool {
    n == position as f64
}

fn refers_to_current(path: &LocationPath) -> bool {
    path.steps().iter().flat_map(Step::predicates).any(Expr::contains_current)
}
