use super::path::SchemaPath;
use crate::expr::Expr;
use crate::qname::QName;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaNodeKind {
    Container,
    List,
    Leaf,
    LeafList,
    Choice,
    Case,
    Input,
    Output,
}

impl SchemaNodeKind {
    /// Choice and case nodes never appear in instance data.
    pub fn is_data_node(self) -> bool {
        !matches!(self, SchemaNodeKind::Choice | SchemaNodeKind::Case)
    }

    pub fn holds_value(self) -> bool {
        matches!(self, SchemaNodeKind::Leaf | SchemaNodeKind::LeafList)
    }

    pub fn is_interior(self) -> bool {
        matches!(self, SchemaNodeKind::Container | SchemaNodeKind::List | SchemaNodeKind::Input | SchemaNodeKind::Output)
    }
}

/// Built-in type information the evaluator needs from a leaf declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafType {
    String,
    Boolean,
    Empty,
    Integer,
    Decimal,
    Enumeration(Vec<(String, i64)>),
    Bits(Vec<(String, u32)>),
    IdentityRef { bases: Vec<QName> },
    LeafRef { path: Expr, require_instance: bool },
    Union(Vec<LeafType>),
}

impl LeafType {
    pub fn is_numeric(&self) -> bool {
        match self {
            LeafType::Integer | LeafType::Decimal => true,
            LeafType::Union(members) => members.iter().all(LeafType::is_numeric),
            _ => false,
        }
    }

    /// Integer value assigned to an enum label, searching union members too.
    pub fn enum_value(&self, label: &str) -> Option<i64> {
        match self {
            LeafType::Enumeration(values) => values.iter().find(|(name, _)| name == label).map(|(_, v)| *v),
            LeafType::Union(members) => members.iter().find_map(|m| m.enum_value(label)),
            _ => None,
        }
    }

    pub fn has_bit(&self, bit: &str) -> bool {
        match self {
            LeafType::Bits(bits) => bits.iter().any(|(name, _)| name == bit),
            LeafType::Union(members) => members.iter().any(|m| m.has_bit(bit)),
            _ => false,
        }
    }

    pub fn identity_bases(&self) -> &[QName] {
        match self {
            LeafType::IdentityRef { bases } => bases,
            LeafType::Union(members) => members.iter().map(LeafType::identity_bases).find(|b| !b.is_empty()).unwrap_or(&[]),
            _ => &[],
        }
    }

    pub fn leafref_path(&self) -> Option<&Expr> {
        match self {
            LeafType::LeafRef { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// A `must` statement with its optional `error-message` and `error-app-tag`.
#[derive(Debug, Clone, PartialEq)]
pub struct MustConstraint {
    expr: Expr,
    error_message: Option<String>,
    error_app_tag: Option<String>,
}

impl MustConstraint {
    pub fn new(expr: Expr) -> Self {
        Self { expr, error_message: None, error_app_tag: None }
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_error_app_tag(mut self, tag: impl Into<String>) -> Self {
        self.error_app_tag = Some(tag.into());
        self
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn error_app_tag(&self) -> Option<&str> {
        self.error_app_tag.as_deref()
    }
}

/// One `unique` statement: a set of descendant paths relative to a list entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueConstraint {
    tags: Vec<Vec<QName>>,
}

impl UniqueConstraint {
    pub fn new<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: IntoIterator<Item = QName>,
    {
        Self { tags: tags.into_iter().map(|tag| tag.into_iter().collect()).collect() }
    }

    pub fn tags(&self) -> &[Vec<QName>] {
        &self.tags
    }
}

impl fmt::Display for UniqueConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            for (j, name) in tag.iter().enumerate() {
                if j > 0 {
                    f.write_str("/")?;
                }
                f.write_str(name.local())?;
            }
        }
        Ok(())
    }
}

/// Declaration of one schema node as seen by the validator.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    path: SchemaPath,
    kind: SchemaNodeKind,
    config: bool,
    mandatory: bool,
    presence: bool,
    mount_point: bool,
    keys: Vec<QName>,
    must: Vec<MustConstraint>,
    when: Option<Expr>,
    default: Option<String>,
    leaf_type: Option<LeafType>,
    unique: Vec<UniqueConstraint>,
}

impl SchemaNode {
    /// `path` must not be the root path.
    pub fn new(path: SchemaPath, kind: SchemaNodeKind) -> Self {
        debug_assert!(!path.is_root(), "schema node needs a name");
        Self {
            path,
            kind,
            config: true,
            mandatory: false,
            presence: false,
            mount_point: false,
            keys: Vec::new(),
            must: Vec::new(),
            when: None,
            default: None,
            leaf_type: None,
            unique: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: bool) -> Self {
        self.config = config;
        self
    }

    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    pub fn with_presence(mut self, presence: bool) -> Self {
        self.presence = presence;
        self
    }

    pub fn with_mount_point(mut self, mount_point: bool) -> Self {
        self.mount_point = mount_point;
        self
    }

    pub fn with_keys(mut self, keys: Vec<QName>) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_must(mut self, must: MustConstraint) -> Self {
        self.must.push(must);
        self
    }

    pub fn with_when(mut self, when: Expr) -> Self {
        self.when = Some(when);
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_type(mut self, leaf_type: LeafType) -> Self {
        self.leaf_type = Some(leaf_type);
        self
    }

    pub fn with_unique(mut self, unique: UniqueConstraint) -> Self {
        self.unique.push(unique);
        self
    }

    pub fn path(&self) -> &SchemaPath {
        &self.path
    }

    pub fn name(&self) -> &QName {
        // Guarded by the constructor's non-root requirement.
        &self.path.names()[self.path.len() - 1]
    }

    pub fn kind(&self) -> SchemaNodeKind {
        self.kind
    }

    pub fn is_config(&self) -> bool {
        self.config
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn is_presence(&self) -> bool {
        self.presence
    }

    pub fn is_mount_point(&self) -> bool {
        self.mount_point
    }

    pub fn keys(&self) -> &[QName] {
        &self.keys
    }

    pub fn first_key(&self) -> Option<&QName> {
        self.keys.first()
    }

    pub fn must(&self) -> &[MustConstraint] {
        &self.must
    }

    pub fn when(&self) -> Option<&Expr> {
        self.when.as_ref()
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn leaf_type(&self) -> Option<&LeafType> {
        self.leaf_type.as_ref()
    }

    pub fn unique(&self) -> &[UniqueConstraint] {
        &self.unique
    }
}

/// An identity declaration with its direct base identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityDecl {
    pub name: QName,
    pub bases: Vec<QName>,
}

impl IdentityDecl {
    pub fn new(name: QName, bases: Vec<QName>) -> Self {
        Self { name, bases }
    }
}
