//! `unique` statements on lists.

use std::collections::BTreeMap;
use tracing::trace;
use yangval_core::{
    ErrorPath, IdSegment, NodeRef, NodeValue, QName, SchemaNavigator, SchemaNode, SchemaPath, UniqueConstraint,
    ValidationError,
};

/// Relative tag path to the string value of the leaf it names.
pub type UniqueKey = BTreeMap<SchemaPath, String>;

/// Checks every `unique` constraint of `list` over the entries below `parent`.
///
/// Entries missing any of the named leaves take no part in the check. All
/// entries sharing a key are reported together, in instance order.
pub fn check_unique(navigator: &dyn SchemaNavigator, list: &SchemaNode, parent: &NodeRef) -> Result<(), ValidationError> {
    let entries = match parent.attribute(list.name()) {
        NodeValue::Children(entries) => entries,
        NodeValue::Child(entry) => vec![entry],
        _ => return Ok(()),
    };
    if entries.len() < 2 {
        return Ok(());
    }
    for constraint in list.unique() {
        let mut groups: BTreeMap<UniqueKey, Vec<usize>> = BTreeMap::new();
        for (index, entry) in entries.iter().enumerate() {
            match unique_key(navigator, list.path(), entry, constraint) {
                Some(key) => groups.entry(key).or_default().push(index),
                None => trace!(entry = %entry.model_node_id(), "entry lacks a unique leaf"),
            }
        }
        let mut colliding: Vec<usize> =
            groups.into_values().filter(|group| group.len() > 1).flatten().collect();
        if colliding.is_empty() {
            continue;
        }
        colliding.sort_unstable();
        return Err(ValidationError::NonUniqueInstance {
            path: ErrorPath::node(parent.model_node_id().child(IdSegment::new(list.name().clone()))),
            message: format!("unique constraint '{constraint}' violated"),
            instances: colliding.into_iter().map(|i| ErrorPath::node(entries[i].model_node_id())).collect(),
        });
    }
    Ok(())
}

/// Key of one list entry, `None` when a leaf is missing.
pub fn unique_key(
    navigator: &dyn SchemaNavigator,
    list_path: &SchemaPath,
    entry: &NodeRef,
    constraint: &UniqueConstraint,
) -> Option<UniqueKey> {
    constraint
        .tags()
        .iter()
        .map(|tag| Some((SchemaPath::from_names(tag.iter().cloned()), tag_value(navigator, list_path, entry, tag)?)))
        .collect()
}

fn tag_value(navigator: &dyn SchemaNavigator, list_path: &SchemaPath, entry: &NodeRef, tag: &[QName]) -> Option<String> {
    let (leaf, interior) = tag.split_last()?;
    let mut at = list_path.clone();
    let mut node = NodeRef::clone(entry);
    for name in interior {
        at = at.child(name.clone());
        if navigator.data_node_at(&at).is_some_and(|schema| !schema.kind().is_data_node()) {
            continue;
        }
        match node.attribute(name) {
            NodeValue::Child(child) => node = child,
            _ => return None,
        }
    }
    match node.attribute(leaf) {
        NodeValue::Scalar(value) => Some(value.to_text()),
        _ => None,
    }
}
