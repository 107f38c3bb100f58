use std::sync::Arc;
use yangval_core::{NameTest, QName, SchemaNavigator, SchemaNodeRef, SchemaPath};

/// Schema child of `parent` named by `test`.
///
/// A prefix is resolved through the navigator. An unprefixed name is looked up
/// in `default_namespace` first, then by local name when that is unambiguous
/// (augmented children live in other modules).
pub(crate) fn resolve_child(
    navigator: &dyn SchemaNavigator,
    parent: &SchemaPath,
    test: &NameTest,
    default_namespace: &str,
) -> Option<SchemaNodeRef> {
    match &test.prefix {
        Some(prefix) => {
            let namespace = navigator.namespace_for(prefix)?;
            navigator.data_child(parent, &QName::new(namespace, Arc::clone(&test.local)))
        }
        None => navigator
            .data_child(parent, &QName::new(default_namespace, Arc::clone(&test.local)))
            .or_else(|| navigator.data_child_by_local(parent, &test.local)),
    }
}

/// Parses `prefix:local` (or `local`) into a qualified name.
pub(crate) fn resolve_qname(navigator: &dyn SchemaNavigator, text: &str, default_namespace: &str) -> Option<QName> {
    let text = text.trim();
    match text.split_once(':') {
        Some((prefix, local)) => Some(QName::new(navigator.namespace_for(prefix)?, local)),
        None if text.is_empty() => None,
        None => Some(QName::new(default_namespace, text)),
    }
}

/// `prefix:local` form of `name`, or the bare local name without a known prefix.
pub(crate) fn prefixed(navigator: &dyn SchemaNavigator, name: &QName) -> String {
    name.to_prefixed(navigator.prefix_for(name.namespace()).as_deref())
}

/// Name test addressing `name`, prefixed when the navigator knows a prefix.
pub(crate) fn name_test(navigator: &dyn SchemaNavigator, name: &QName) -> NameTest {
    match navigator.prefix_for(name.namespace()) {
        Some(prefix) => NameTest::prefixed(prefix, name.local()),
        None => NameTest::new(name.local()),
    }
}
