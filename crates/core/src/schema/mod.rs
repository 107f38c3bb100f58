mod navigator;
mod node;
mod path;

pub use navigator::{SchemaNavigator, SchemaNodeRef};
pub use node::{IdentityDecl, LeafType, MustConstraint, SchemaNode, SchemaNodeKind, UniqueConstraint};
pub use path::SchemaPath;
