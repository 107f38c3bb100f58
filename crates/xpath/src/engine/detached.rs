//! State data returned by a provider, presented as instance nodes.
//!
//! Children are built when first asked for and hold their parent strongly, so
//! a node reached by navigation keeps its ancestors alive for `..` steps.

use std::fmt;
use std::sync::{Arc, Weak};
use yangval_core::{
    Element, IdSegment, InstanceNode, ModelNodeId, NodeRef, NodeValue, QName, Scalar, SchemaNavigator,
    SchemaNodeKind, SchemaPath,
};

enum Parent {
    Attached(NodeRef),
    Detached(Arc<DetachedNode>),
}

/// Read-only snapshot node hanging below the configuration node it was
/// requested for.
pub(crate) struct DetachedNode {
    me: Weak<DetachedNode>,
    element: Element,
    parent: Parent,
    schema_path: SchemaPath,
    id: ModelNodeId,
    navigator: Arc<dyn SchemaNavigator>,
}

impl DetachedNode {
    /// `position` is the 1-based index of `element` among the entries of a
    /// keyless list.
    pub(crate) fn attach(
        element: &Element,
        anchor: &NodeRef,
        navigator: &Arc<dyn SchemaNavigator>,
        position: Option<usize>,
    ) -> Arc<Self> {
        let schema_path = navigator
            .data_child(&anchor.schema_path(), element.name())
            .map_or_else(|| anchor.schema_path().child(element.name().clone()), |node| node.path().clone());
        let parent_id = anchor.model_node_id();
        build(element, Parent::Attached(NodeRef::clone(anchor)), &parent_id, schema_path, navigator, position)
    }

    fn child(&self, element: &Element, schema_path: SchemaPath, position: Option<usize>) -> Option<NodeRef> {
        let me = self.me.upgrade()?;
        Some(build(element, Parent::Detached(me), &self.id, schema_path, &self.navigator, position) as NodeRef)
    }
}

fn build(
    element: &Element,
    parent: Parent,
    parent_id: &ModelNodeId,
    schema_path: SchemaPath,
    navigator: &Arc<dyn SchemaNavigator>,
    position: Option<usize>,
) -> Arc<DetachedNode> {
    let mut segment = IdSegment::new(element.name().clone());
    if let Some(schema) = navigator.data_node_at(&schema_path) {
        for key in schema.keys() {
            if let Some(value) = element.children().iter().find(|child| child.name() == key).and_then(Element::value) {
                segment = segment.with_key(key.clone(), value.to_text());
            }
        }
    }
    if let Some(position) = position {
        segment = segment.with_position(position);
    }
    Arc::new_cyclic(|me| DetachedNode {
        me: me.clone(),
        element: element.clone(),
        parent,
        schema_path,
        id: parent_id.child(segment),
        navigator: Arc::clone(navigator),
    })
}

fn infer_kind(element: &Element) -> SchemaNodeKind {
    if element.children().is_empty() && element.value().is_some() {
        SchemaNodeKind::Leaf
    } else {
        SchemaNodeKind::Container
    }
}

fn value_of(element: &Element) -> Scalar {
    element.value().cloned().unwrap_or_else(|| Scalar::from(""))
}

impl InstanceNode for DetachedNode {
    fn name(&self) -> QName {
        self.element.name().clone()
    }

    fn parent(&self) -> Option<NodeRef> {
        match &self.parent {
            Parent::Attached(node) => Some(NodeRef::clone(node)),
            Parent::Detached(node) => Some(Arc::clone(node) as NodeRef),
        }
    }

    fn attribute(&self, name: &QName) -> NodeValue {
        let matching: Vec<&Element> = self.element.children().iter().filter(|child| child.name() == name).collect();
        let Some(first) = matching.first() else {
            return NodeValue::Absent;
        };
        let schema = self.navigator.data_child(&self.schema_path, name);
        let kind = schema.as_ref().map_or_else(|| infer_kind(first), |node| node.kind());
        let keyless = schema.as_ref().is_some_and(|node| node.keys().is_empty());
        let path = schema.map_or_else(|| self.schema_path.child(name.clone()), |node| node.path().clone());
        match kind {
            SchemaNodeKind::Leaf => NodeValue::Scalar(value_of(first)),
            SchemaNodeKind::LeafList => NodeValue::LeafSet(matching.iter().map(|element| value_of(element)).collect()),
            SchemaNodeKind::List => NodeValue::Children(
                matching
                    .iter()
                    .enumerate()
                    .filter_map(|(index, element)| self.child(element, path.clone(), keyless.then_some(index + 1)))
                    .collect(),
            ),
            _ => self.child(first, path, None).map_or(NodeValue::Absent, NodeValue::Child),
        }
    }

    fn schema_path(&self) -> SchemaPath {
        self.schema_path.clone()
    }

    fn model_node_id(&self) -> ModelNodeId {
        self.id.clone()
    }
}

impl fmt::Debug for DetachedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetachedNode").field("id", &self.id).field("schema_path", &self.schema_path).finish_non_exhaustive()
    }
}
