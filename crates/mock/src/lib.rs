//! Deterministic collaborators for exercising the validator without a datastore.
//!
//! [`MockSchema`] plays the schema registry, [`MockTree`] the configuration
//! tree (loaded from NETCONF-style XML) and [`MockStateProvider`] a subsystem
//! answering state-data requests.

mod schema;
mod state;
mod tree;

pub use schema::{MockSchema, NodeSpec};
pub use state::MockStateProvider;
pub use tree::{MockNode, MockTree, MockTreeLoadError};

#[cfg(test)]
mod tests;
