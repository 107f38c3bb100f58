//! Crossing from configuration into state data.
//!
//! The first time an evaluation steps from a configuration node into a
//! non-configuration child, the state provider is asked for that child. The
//! answer is kept in the validation context under the anchor and the request
//! filter, so later evaluations asking for the same subtree reuse it.

use super::Evaluator;
use crate::engine::detached::DetachedNode;
use crate::names::resolve_child;
use crate::timeout::block_on_timeout;
use crate::value::Item;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use yangval_core::{
    Axis, BinaryOp, Element, Expr, FilterNode, Literal, NodeRef, Scalar, SchemaNavigator, SchemaNodeKind,
    SchemaNodeRef, StateError, StateFilter, Step, ValidationError, format_number,
};

impl Evaluator<'_> {
    pub(super) fn state_items(
        &mut self,
        anchor: &NodeRef,
        schema: &SchemaNodeRef,
        navigator: &Arc<dyn SchemaNavigator>,
        rest: &[Step],
    ) -> Result<Vec<Item>, ValidationError> {
        let anchor_id = anchor.model_node_id();
        let name = schema.name().clone();
        let filter = self.filter_tree(schema, navigator.as_ref(), rest);
        if self.ctx.state_snapshot(&anchor_id, &filter).is_none() {
            let elements = self.retrieve(anchor, schema, filter.clone())?;
            debug!(anchor = %anchor_id, name = %name, elements = elements.len(), "state snapshot stored");
            self.ctx.store_state_snapshot(anchor_id.clone(), filter.clone(), elements);
        }
        let elements = self.ctx.state_snapshot(&anchor_id, &filter).unwrap_or_default();
        let keyless_list = schema.kind() == SchemaNodeKind::List && schema.keys().is_empty();
        let items = elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                if schema.kind().holds_value() {
                    let value = element.value().cloned().unwrap_or_else(|| Scalar::from(""));
                    Item::leaf(NodeRef::clone(anchor), name.clone(), value)
                } else {
                    let position = keyless_list.then_some(index + 1);
                    Item::Node(DetachedNode::attach(element, anchor, navigator, position))
                }
            })
            .collect();
        Ok(items)
    }

    fn retrieve(&self, anchor: &NodeRef, schema: &SchemaNodeRef, tree: FilterNode) -> Result<Vec<Element>, ValidationError> {
        let Some(provider) = self.env.state else {
            return Ok(Vec::new());
        };
        let anchor_id = anchor.model_node_id();
        let filter = StateFilter::new(vec![schema.name().clone()], vec![tree]);
        let request = BTreeMap::from([(anchor_id.clone(), filter)]);
        let timeout = self.env.config.state_timeout();
        let failure = |error: StateError| ValidationError::StateRetrievalFailure {
            path: self.error_path(),
            message: error.to_string(),
        };
        match block_on_timeout(provider.retrieve_state(request), timeout) {
            None => Err(failure(StateError::Timeout(timeout))),
            Some(Err(error)) => Err(failure(error)),
            Some(Ok(mut response)) => Ok(response
                .remove(&anchor_id)
                .unwrap_or_default()
                .into_iter()
                .filter(|element| element.name() == schema.name())
                .collect()),
        }
    }

    /// Subtree filter selecting `schema` and the nodes the remaining steps
    /// walk through. `key = 'literal'` predicates on a list key become content
    /// matches.
    fn filter_tree(&self, schema: &SchemaNodeRef, navigator: &dyn SchemaNavigator, rest: &[Step]) -> FilterNode {
        let mut chain = Vec::new();
        let mut at = schema.path().clone();
        let mut current = FilterNode::new(schema.name().clone());
        if schema.kind().holds_value() {
            return current;
        }
        for step in rest {
            if step.axis() != Axis::Child {
                break;
            }
            let Some(child) =
                step.test().and_then(|test| resolve_child(navigator, &at, test, &self.default_namespace))
            else {
                break;
            };
            let mut node = FilterNode::new(child.name().clone());
            if let Some(value) = step.predicates().iter().find_map(|p| self.key_match(&child, navigator, p)) {
                node = node.with_match(value);
            }
            chain.push(current);
            current = node;
            if child.kind().holds_value() {
                break;
            }
            at = child.path().clone();
        }
        chain.into_iter().rev().fold(current, |inner, outer| outer.with_child(inner))
    }

    /// `'literal'` of a `key = 'literal'` predicate, when `key` is a key leaf
    /// of `list`.
    fn key_match(&self, list: &SchemaNodeRef, navigator: &dyn SchemaNavigator, predicate: &Expr) -> Option<String> {
        let Expr::Binary { op: BinaryOp::Eq, left, right } = predicate else {
            return None;
        };
        let (Expr::Path(path), Expr::Literal(literal)) = (left.as_ref(), right.as_ref()) else {
            return None;
        };
        let [step] = path.steps() else {
            return None;
        };
        if path.is_absolute() || step.axis() != Axis::Child || !step.predicates().is_empty() {
            return None;
        }
        let leaf = step.test().and_then(|test| resolve_child(navigator, list.path(), test, &self.default_namespace))?;
        if !list.keys().contains(leaf.name()) {
            return None;
        }
        Some(match literal {
            Literal::String(s) => s.to_string(),
            Literal::Number(n) => format_number(*n),
        })
    }
}
