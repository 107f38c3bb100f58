use std::fmt;
use std::sync::Arc;

/// Namespace-qualified name of a schema or instance node.
///
/// Two names are equal when both the namespace URI and the local name match.
/// Prefixes never take part in equality; they are resolved through the
/// [`SchemaNavigator`](crate::SchemaNavigator) when an expression is evaluated.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QName {
    namespace: Arc<str>,
    local: Arc<str>,
}

impl QName {
    pub fn new(namespace: impl Into<Arc<str>>, local: impl Into<Arc<str>>) -> Self {
        Self { namespace: namespace.into(), local: local.into() }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    /// Same namespace, different local name.
    pub fn sibling(&self, local: impl Into<Arc<str>>) -> Self {
        Self { namespace: Arc::clone(&self.namespace), local: local.into() }
    }

    /// `prefix:local` form, or the bare local name when no prefix is known.
    pub fn to_prefixed(&self, prefix: Option<&str>) -> String {
        match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", self.local),
            _ => self.local.to_string(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.namespace, self.local)
    }
}

impl fmt::Debug for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QName({self})")
    }
}
