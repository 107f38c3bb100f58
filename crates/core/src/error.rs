use crate::instance::ModelNodeId;
use crate::qname::QName;
use std::fmt;

/// Instance path of the node a violation is reported against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorPath {
    node: ModelNodeId,
    leaf: Option<QName>,
}

impl ErrorPath {
    pub fn node(node: ModelNodeId) -> Self {
        Self { node, leaf: None }
    }

    pub fn leaf(owner: ModelNodeId, leaf: QName) -> Self {
        Self { node: owner, leaf: Some(leaf) }
    }

    pub fn model_node_id(&self) -> &ModelNodeId {
        &self.node
    }

    pub fn leaf_name(&self) -> Option<&QName> {
        self.leaf.as_ref()
    }
}

impl fmt::Display for ErrorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.leaf {
            Some(leaf) if self.node.is_root() => write!(f, "/{}", leaf.local()),
            Some(leaf) => write!(f, "{}/{}", self.node, leaf.local()),
            None => write!(f, "{}", self.node),
        }
    }
}

fn join_paths(paths: &[ErrorPath]) -> String {
    paths.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Errors surfaced to the datastore by the validation core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("must constraint violated at {path}: {message}")]
    MustViolation { path: ErrorPath, message: String, app_tag: String },
    #[error("when condition not satisfied at {path}: {message}")]
    WhenViolation { path: ErrorPath, message: String },
    #[error("leafref at {path} has no matching instance: {message}")]
    InstanceRequired { path: ErrorPath, message: String },
    #[error("missing mandatory node {path}: {message}")]
    MissingMandatoryNode { path: ErrorPath, message: String },
    #[error("non-unique instances under {path} ({}): {message}", join_paths(.instances))]
    NonUniqueInstance { path: ErrorPath, message: String, instances: Vec<ErrorPath> },
    #[error("unsupported extension function '{function}' at {path}")]
    UnsupportedExtensionFunction { path: ErrorPath, function: String },
    #[error("unable to evaluate state data at {path}: {message}")]
    StateRetrievalFailure { path: ErrorPath, message: String },
    #[error("unresolved schema reference '{reference}' at {path}")]
    UnresolvedReference { path: ErrorPath, reference: String },
}

impl ValidationError {
    pub fn path(&self) -> &ErrorPath {
        match self {
            ValidationError::MustViolation { path, .. }
            | ValidationError::WhenViolation { path, .. }
            | ValidationError::InstanceRequired { path, .. }
            | ValidationError::MissingMandatoryNode { path, .. }
            | ValidationError::NonUniqueInstance { path, .. }
            | ValidationError::UnsupportedExtensionFunction { path, .. }
            | ValidationError::StateRetrievalFailure { path, .. }
            | ValidationError::UnresolvedReference { path, .. } => path,
        }
    }

    /// NETCONF `error-app-tag` for the violation, where one applies.
    pub fn app_tag(&self) -> Option<&str> {
        match self {
            ValidationError::MustViolation { app_tag, .. } => Some(app_tag),
            ValidationError::NonUniqueInstance { .. } => Some("data-not-unique"),
            ValidationError::InstanceRequired { .. } => Some("instance-required"),
            _ => None,
        }
    }
}
