//! Data model and collaborator contracts shared by the YANG constraint validator.
//!
//! The crate holds no evaluation logic. It describes the three
//! collaborators the engine talks to (schema navigator, instance tree, state
//! provider), the expression AST produced by an external parser, and the error
//! taxonomy reported back to the datastore.

pub mod config;
pub mod error;
pub mod expr;
pub mod instance;
pub mod qname;
pub mod schema;
pub mod state;

pub use config::{ReferencePolicy, ValidatorConfig};
pub use error::{ErrorPath, ValidationError};
pub use expr::{Axis, BinaryOp, Expr, Function, Literal, LocationPath, NameTest, Step, format_number, parse_number};
pub use instance::{IdSegment, InstanceNode, InstanceRoots, ModelNodeId, NodeRef, NodeValue, Scalar};
pub use qname::QName;
pub use schema::{
    IdentityDecl, LeafType, MustConstraint, SchemaNavigator, SchemaNode, SchemaNodeKind, SchemaNodeRef,
    SchemaPath, UniqueConstraint,
};
pub use state::{Element, FilterNode, StateError, StateFilter, StateProvider, StateRequest, StateResponse};
