mod id;

pub use id::{IdSegment, ModelNodeId};

use crate::expr::{format_number, parse_number};
use crate::qname::QName;
use crate::schema::SchemaPath;
use std::fmt;
use std::sync::Arc;

/// A leaf value as stored in the instance tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(Arc<str>),
    Number(f64),
    Boolean(bool),
}

impl Scalar {
    pub fn to_text(&self) -> String {
        match self {
            Scalar::String(s) => s.to_string(),
            Scalar::Number(n) => format_number(*n),
            Scalar::Boolean(b) => b.to_string(),
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Scalar::String(s) => parse_number(s),
            Scalar::Number(n) => *n,
            Scalar::Boolean(b) => f64::from(u8::from(*b)),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.into())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        Scalar::Number(value as f64)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Boolean(value)
    }
}

/// Result of looking up one attribute (child) of an instance node.
#[derive(Debug, Clone)]
pub enum NodeValue {
    Scalar(Scalar),
    Child(NodeRef),
    Children(Vec<NodeRef>),
    LeafSet(Vec<Scalar>),
    Absent,
}

impl NodeValue {
    pub fn is_absent(&self) -> bool {
        match self {
            NodeValue::Absent => true,
            NodeValue::Children(nodes) => nodes.is_empty(),
            NodeValue::LeafSet(values) => values.is_empty(),
            NodeValue::Scalar(_) | NodeValue::Child(_) => false,
        }
    }
}

/// A container or list entry of the live configuration tree.
///
/// Leaves are not nodes: they are read as [`NodeValue::Scalar`] or
/// [`NodeValue::LeafSet`] attributes of their parent.
pub trait InstanceNode: Send + Sync + fmt::Debug {
    fn name(&self) -> QName;

    fn parent(&self) -> Option<NodeRef>;

    fn attribute(&self, name: &QName) -> NodeValue;

    fn schema_path(&self) -> SchemaPath;

    fn model_node_id(&self) -> ModelNodeId;
}

pub type NodeRef = Arc<dyn InstanceNode>;

/// Access to the top-level nodes of the datastore, used when an absolute path
/// names a root other than the one the context node lives under.
pub trait InstanceRoots: Send + Sync {
    fn root(&self, name: &QName) -> Option<NodeRef>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn scalar_conversions() {
        assert_eq!(Scalar::from(5_i64).to_text(), "5");
        assert!((Scalar::from("12").to_number() - 12.0).abs() < f64::EPSILON);
        assert!(Scalar::from("twelve").to_number().is_nan());
        assert!((Scalar::from(true).to_number() - 1.0).abs() < f64::EPSILON);
    }
}
