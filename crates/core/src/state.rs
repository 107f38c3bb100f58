//! Contract with subsystems that supply non-configuration ("state") data.
//!
//! The validator sends one [`StateRequest`] per context node and state subtree,
//! treats the returned elements as a snapshot and never re-queries while an
//! expression is being evaluated.

use crate::instance::{ModelNodeId, Scalar};
use crate::qname::QName;
use futures_lite::future::Boxed;
use std::collections::BTreeMap;
use std::time::Duration;

/// Detached element returned by a state provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: QName,
    value: Option<Scalar>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self { name, value: None, children: Vec::new() }
    }

    pub fn leaf(name: QName, value: impl Into<Scalar>) -> Self {
        Self { name, value: Some(value.into()), children: Vec::new() }
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn value(&self) -> Option<&Scalar> {
        self.value.as_ref()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }
}

/// Subtree filter node; `match_value` narrows list entries by key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterNode {
    name: QName,
    match_value: Option<String>,
    children: Vec<FilterNode>,
}

impl FilterNode {
    pub fn new(name: QName) -> Self {
        Self { name, match_value: None, children: Vec::new() }
    }

    pub fn with_match(mut self, value: impl Into<String>) -> Self {
        self.match_value = Some(value.into());
        self
    }

    pub fn with_child(mut self, child: FilterNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn match_value(&self) -> Option<&str> {
        self.match_value.as_deref()
    }

    pub fn children(&self) -> &[FilterNode] {
        &self.children
    }
}

/// The names requested below one context node plus the filter tree
/// restricting what the provider has to return.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateFilter {
    names: Vec<QName>,
    tree: Vec<FilterNode>,
}

impl StateFilter {
    pub fn new(names: Vec<QName>, tree: Vec<FilterNode>) -> Self {
        Self { names, tree }
    }

    pub fn names(&self) -> &[QName] {
        &self.names
    }

    pub fn tree(&self) -> &[FilterNode] {
        &self.tree
    }
}

pub type StateRequest = BTreeMap<ModelNodeId, StateFilter>;
pub type StateResponse = BTreeMap<ModelNodeId, Vec<Element>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("no state provider is registered for this subtree")]
    Unavailable,
    #[error("state retrieval timed out after {} ms", .0.as_millis())]
    Timeout(Duration),
    #[error("state provider failed: {0}")]
    Provider(String),
}

/// Supplies live state for the nodes named in a request.
///
/// The returned future may block on device I/O; the validator races it
/// against its configured timeout.
pub trait StateProvider: Send + Sync {
    fn retrieve_state(&self, request: StateRequest) -> Boxed<Result<StateResponse, StateError>>;
}
