//! Expression evaluation over the instance tree.

mod detached;
pub(crate) mod evaluator;
mod functions;

pub(crate) use evaluator::Evaluator;

use crate::identity::IdentityResolver;
use crate::value::Item;
use std::sync::Arc;
use yangval_core::{
    InstanceRoots, NodeRef, NodeValue, QName, SchemaNavigator, SchemaPath, StateProvider, ValidatorConfig,
};

/// Collaborators shared by every evaluation of one validator.
#[derive(Clone, Copy)]
pub(crate) struct Env<'a> {
    pub navigator: &'a Arc<dyn SchemaNavigator>,
    pub roots: Option<&'a dyn InstanceRoots>,
    pub state: Option<&'a dyn StateProvider>,
    pub identities: &'a IdentityResolver,
    pub config: &'a ValidatorConfig,
}

impl Env<'_> {
    /// Same collaborators without state retrieval.
    pub(crate) fn without_state(self) -> Self {
        Self { state: None, ..self }
    }
}

/// Navigator responsible for `node`: the root schema, or the schema mounted
/// at the closest mount point above it.
pub(crate) fn navigator_for(root: &Arc<dyn SchemaNavigator>, node: &NodeRef) -> Arc<dyn SchemaNavigator> {
    let mut ancestors = Vec::new();
    let mut current = node.parent();
    while let Some(parent) = current {
        current = parent.parent();
        ancestors.push(parent);
    }
    let mut navigator = Arc::clone(root);
    for ancestor in ancestors.iter().rev() {
        if let Some(mounted) = mounted_navigator(&navigator, &ancestor.schema_path()) {
            navigator = mounted;
        }
    }
    navigator
}

/// Navigator and schema path under which the children of `node` are declared.
pub(crate) fn children_scope(root: &Arc<dyn SchemaNavigator>, node: &NodeRef) -> (Arc<dyn SchemaNavigator>, SchemaPath) {
    let navigator = navigator_for(root, node);
    let path = node.schema_path();
    match mounted_navigator(&navigator, &path) {
        Some(mounted) => (mounted, SchemaPath::root()),
        None => (navigator, path),
    }
}

fn mounted_navigator(navigator: &Arc<dyn SchemaNavigator>, path: &SchemaPath) -> Option<Arc<dyn SchemaNavigator>> {
    let node = navigator.data_node_at(path)?;
    if !node.is_mount_point() {
        return None;
    }
    navigator.mount_registry_for(path)
}

/// Items stored under `name` on `node`, in instance order.
pub(crate) fn attribute_items(node: &NodeRef, name: &QName) -> Vec<Item> {
    match node.attribute(name) {
        NodeValue::Scalar(value) => vec![Item::leaf(NodeRef::clone(node), name.clone(), value)],
        NodeValue::LeafSet(values) => {
            values.into_iter().map(|value| Item::leaf(NodeRef::clone(node), name.clone(), value)).collect()
        }
        NodeValue::Child(child) => vec![Item::Node(child)],
        NodeValue::Children(children) => children.into_iter().map(Item::Node).collect(),
        NodeValue::Absent => Vec::new(),
    }
}
