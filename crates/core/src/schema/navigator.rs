use super::node::{IdentityDecl, SchemaNode};
use super::path::SchemaPath;
use crate::qname::QName;
use std::sync::Arc;

pub type SchemaNodeRef = Arc<SchemaNode>;

/// Read-only view of a compiled schema.
///
/// Implementations answer structural questions only; the validator never asks
/// a navigator to change anything. Provided methods flatten choice and case
/// nodes the way instance data does.
pub trait SchemaNavigator: Send + Sync {
    fn data_node_at(&self, path: &SchemaPath) -> Option<SchemaNodeRef>;

    /// Direct schema children, choice and case nodes included.
    fn children_of(&self, path: &SchemaPath) -> Vec<SchemaNodeRef>;

    fn root_nodes(&self) -> Vec<SchemaNodeRef> {
        self.children_of(&SchemaPath::root())
    }

    fn prefix_for(&self, namespace: &str) -> Option<String>;

    fn namespace_for(&self, prefix: &str) -> Option<String>;

    /// Navigator of the schema mounted at `path`, if `path` is a mount point.
    fn mount_registry_for(&self, _path: &SchemaPath) -> Option<Arc<dyn SchemaNavigator>> {
        None
    }

    fn identities(&self) -> Vec<IdentityDecl> {
        Vec::new()
    }

    /// Children as they appear in instance data: choice/case contents are lifted.
    fn data_children_of(&self, path: &SchemaPath) -> Vec<SchemaNodeRef> {
        let mut out = Vec::new();
        for child in self.children_of(path) {
            if child.kind().is_data_node() {
                out.push(child);
            } else {
                out.extend(self.data_children_of(child.path()));
            }
        }
        out
    }

    fn data_child(&self, parent: &SchemaPath, name: &QName) -> Option<SchemaNodeRef> {
        self.data_children_of(parent).into_iter().find(|child| child.name() == name)
    }

    /// Lookup by local name; only succeeds when the name is unambiguous.
    fn data_child_by_local(&self, parent: &SchemaPath, local: &str) -> Option<SchemaNodeRef> {
        let mut matches = self.data_children_of(parent).into_iter().filter(|child| child.name().local() == local);
        let first = matches.next()?;
        if matches.next().is_some() { None } else { Some(first) }
    }

    /// Nearest ancestor that can hold instance data (root included).
    fn data_parent_of(&self, path: &SchemaPath) -> Option<SchemaPath> {
        let mut current = path.parent()?;
        while !current.is_root() {
            match self.data_node_at(&current) {
                Some(node) if !node.kind().is_data_node() => current = current.parent()?,
                _ => break,
            }
        }
        Some(current)
    }

    /// Instance-level name chain of `path` (choice and case removed).
    fn data_names_of(&self, path: &SchemaPath) -> Vec<QName> {
        let mut names = Vec::with_capacity(path.len());
        let mut current = SchemaPath::root();
        for name in path.names() {
            current = current.child(name.clone());
            let is_data = self.data_node_at(&current).is_none_or(|node| node.kind().is_data_node());
            if is_data {
                names.push(name.clone());
            }
        }
        names
    }
}
