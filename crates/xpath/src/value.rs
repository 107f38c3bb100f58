//! Dynamically typed evaluation results.

use std::fmt;
use yangval_core::{
    ErrorPath, IdSegment, ModelNodeId, NodeRef, QName, Scalar, SchemaNavigator, SchemaNodeRef,
    parse_number,
};

/// One member of a node-set, and the focus an expression is evaluated against.
#[derive(Clone)]
pub enum Item {
    Node(NodeRef),
    /// A leaf or leaf-list value read from its owning node.
    Leaf { owner: NodeRef, name: QName, value: Scalar },
    /// A node that does not exist (yet); its parent does.
    Pending { parent: NodeRef, name: QName },
}

impl Item {
    pub fn leaf(owner: NodeRef, name: QName, value: Scalar) -> Self {
        Item::Leaf { owner, name, value }
    }

    pub fn pending(parent: NodeRef, name: QName) -> Self {
        Item::Pending { parent, name }
    }

    pub fn name(&self) -> QName {
        match self {
            Item::Node(node) => node.name(),
            Item::Leaf { name, .. } | Item::Pending { name, .. } => name.clone(),
        }
    }

    /// Node whose parent axis this item leads to.
    pub fn parent(&self) -> Option<NodeRef> {
        match self {
            Item::Node(node) => node.parent(),
            Item::Leaf { owner, .. } => Some(NodeRef::clone(owner)),
            Item::Pending { parent, .. } => Some(NodeRef::clone(parent)),
        }
    }

    /// The nearest existing instance node: the node itself or its owner.
    pub fn anchor(&self) -> &NodeRef {
        match self {
            Item::Node(node) => node,
            Item::Leaf { owner, .. } => owner,
            Item::Pending { parent, .. } => parent,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Item::Pending { .. })
    }

    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Item::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn scalar(&self) -> Option<&Scalar> {
        match self {
            Item::Leaf { value, .. } => Some(value),
            _ => None,
        }
    }

    /// XPath string-value. Interior nodes carry no text; pending nodes none at all.
    pub fn string_value(&self) -> Option<String> {
        match self {
            Item::Leaf { value, .. } => Some(value.to_text()),
            Item::Node(_) => Some(String::new()),
            Item::Pending { .. } => None,
        }
    }

    /// Instance identity; leaf-list values are told apart by their value.
    pub fn id(&self) -> ModelNodeId {
        match self {
            Item::Node(node) => node.model_node_id(),
            Item::Leaf { owner, name, value } => {
                owner.model_node_id().child(IdSegment::new(name.clone()).with_key(name.clone(), value.to_text()))
            }
            Item::Pending { parent, name } => parent.model_node_id().child(IdSegment::new(name.clone())),
        }
    }

    pub fn error_path(&self) -> ErrorPath {
        match self {
            Item::Node(node) => ErrorPath::node(node.model_node_id()),
            Item::Leaf { owner, name, .. } => ErrorPath::leaf(owner.model_node_id(), name.clone()),
            Item::Pending { parent, name } => ErrorPath::leaf(parent.model_node_id(), name.clone()),
        }
    }

    /// Schema node describing this item, looked up in `navigator`.
    pub fn schema_node(&self, navigator: &dyn SchemaNavigator) -> Option<SchemaNodeRef> {
        match self {
            Item::Node(node) => navigator.data_node_at(&node.schema_path()),
            Item::Leaf { owner, name, .. } | Item::Pending { parent: owner, name } => {
                navigator.data_child(&owner.schema_path(), name)
            }
        }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Node(node) => write!(f, "Node({})", node.model_node_id()),
            Item::Leaf { owner, name, value } => {
                write!(f, "Leaf({}/{} = {value:?})", owner.model_node_id(), name.local())
            }
            Item::Pending { parent, name } => write!(f, "Pending({}/{})", parent.model_node_id(), name.local()),
        }
    }
}

impl From<NodeRef> for Item {
    fn from(node: NodeRef) -> Self {
        Item::Node(node)
    }
}

/// Result of evaluating an expression.
///
/// `Absent` is distinct from `Bool(false)`: it means navigation did not reach
/// any data at all, which callers treat as "not created yet".
#[derive(Debug, Clone)]
pub enum EvalResult {
    Bool(bool),
    Scalar(Scalar),
    NodeSet(Vec<Item>),
    Absent,
}

impl EvalResult {
    pub fn is_absent(&self) -> bool {
        matches!(self, EvalResult::Absent)
    }

    /// Boolean conversion: numbers are true unless zero or NaN, `"true"` and
    /// `"false"` map literally, other numeric strings follow the number rule,
    /// remaining strings are true when non-empty, node-sets when non-empty.
    pub fn to_bool(&self) -> bool {
        match self {
            EvalResult::Absent => false,
            EvalResult::Bool(b) => *b,
            EvalResult::Scalar(scalar) => scalar_to_bool(scalar),
            EvalResult::NodeSet(items) => !items.is_empty(),
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            EvalResult::Absent => f64::NAN,
            EvalResult::Bool(b) => f64::from(u8::from(*b)),
            EvalResult::Scalar(scalar) => scalar.to_number(),
            EvalResult::NodeSet(items) => match items.first() {
                Some(Item::Leaf { value, .. }) => value.to_number(),
                Some(item) => item.string_value().map_or(f64::NAN, |s| parse_number(&s)),
                None => f64::NAN,
            },
        }
    }

    /// String conversion; `None` only for a pending first node.
    pub fn to_text(&self) -> Option<String> {
        match self {
            EvalResult::Absent => Some(String::new()),
            EvalResult::Bool(b) => Some(b.to_string()),
            EvalResult::Scalar(scalar) => Some(scalar.to_text()),
            EvalResult::NodeSet(items) => items.first().map_or(Some(String::new()), Item::string_value),
        }
    }

    pub fn items(&self) -> &[Item] {
        match self {
            EvalResult::NodeSet(items) => items,
            _ => &[],
        }
    }

    pub fn into_items(self) -> Vec<Item> {
        match self {
            EvalResult::NodeSet(items) => items,
            _ => Vec::new(),
        }
    }

    /// String values of every leaf in a node-set, in order.
    pub fn leaf_values(&self) -> Vec<String> {
        self.items().iter().filter_map(|item| item.scalar().map(Scalar::to_text)).collect()
    }

    pub(crate) fn number(value: f64) -> Self {
        EvalResult::Scalar(Scalar::Number(value))
    }

    pub(crate) fn string(value: impl Into<String>) -> Self {
        EvalResult::Scalar(Scalar::from(value.into()))
    }
}

impl PartialEq<bool> for EvalResult {
    fn eq(&self, other: &bool) -> bool {
        matches!(self, EvalResult::Bool(b) if b == other)
    }
}

pub(crate) fn scalar_to_bool(scalar: &Scalar) -> bool {
    match scalar {
        Scalar::Boolean(b) => *b,
        Scalar::Number(n) => number_to_bool(*n),
        Scalar::String(s) => string_to_bool(s),
    }
}

fn number_to_bool(n: f64) -> bool {
    n != 0.0 && !n.is_nan()
}

fn string_to_bool(s: &str) -> bool {
    match s {
        "true" => true,
        "false" => false,
        _ => {
            let n = parse_number(s);
            if n.is_nan() { !s.is_empty() } else { number_to_bool(n) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EvalResult::Absent, false)]
    #[case(EvalResult::number(0.0), false)]
    #[case(EvalResult::number(-0.0), false)]
    #[case(EvalResult::number(f64::NAN), false)]
    #[case(EvalResult::number(2.5), true)]
    #[case(EvalResult::string("0"), false)]
    #[case(EvalResult::string(" 0 "), false)]
    #[case(EvalResult::string("12"), true)]
    #[case(EvalResult::string("false"), false)]
    #[case(EvalResult::string("true"), true)]
    #[case(EvalResult::string("up"), true)]
    #[case(EvalResult::string(""), false)]
    #[case(EvalResult::NodeSet(Vec::new()), false)]
    #[case(EvalResult::Bool(true), true)]
    fn boolean_conversion(#[case] value: EvalResult, #[case] expected: bool) {
        assert_eq!(value.to_bool(), expected, "{value:?}");
    }

    #[rstest]
    fn absent_converts_to_empty_string_and_nan() {
        assert_eq!(EvalResult::Absent.to_text().as_deref(), Some(""));
        assert!(EvalResult::Absent.to_number().is_nan());
    }
}
