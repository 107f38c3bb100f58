//! Evaluation of YANG `must`, `when`, `unique` and leafref constraints.
//!
//! [`Validator`] is the entry point: it normalizes an expression for its
//! context node, evaluates it against the instance tree and turns the result
//! into a verdict or a [`ValidationError`](yangval_core::ValidationError).
//! [`resolve_references`] and [`ImpactIndex`] answer the reverse question of
//! which constraints read a given schema node.

mod access_path;
mod context;
mod engine;
mod identity;
mod impact;
mod names;
mod normalize;
mod timeout;
mod unique;
mod validator;
mod value;

pub use access_path::{AccessPath, AccessPathMap, resolve_references};
pub use context::ValidationContext;
pub use identity::IdentityResolver;
pub use impact::{ConstraintKind, Impact, ImpactIndex};
pub use normalize::{CurrentBinding, Normalizer};
pub use unique::{UniqueKey, check_unique, unique_key};
pub use validator::Validator;
pub use value::{EvalResult, Item};
