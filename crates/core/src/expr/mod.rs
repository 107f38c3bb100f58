//! Expression AST consumed by the evaluator.
//!
//! The tree is produced by an external XPath parser and is immutable: every
//! rewrite (see the normalizer in `yangval-xpath`) builds a new tree. The
//! constructors below exist so that callers and tests can assemble trees
//! without a parser.

mod display;
mod number;

pub use number::{format_number, parse_number};

use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(Arc<str>),
    Number(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    SelfNode,
    Parent,
    Child,
}

/// A name test as written in the expression (`prefix:local` or `local`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameTest {
    pub prefix: Option<Arc<str>>,
    pub local: Arc<str>,
}

impl NameTest {
    pub fn new(local: impl Into<Arc<str>>) -> Self {
        Self { prefix: None, local: local.into() }
    }

    pub fn prefixed(prefix: impl Into<Arc<str>>, local: impl Into<Arc<str>>) -> Self {
        Self { prefix: Some(prefix.into()), local: local.into() }
    }

    pub fn with_prefix(&self, prefix: impl Into<Arc<str>>) -> Self {
        Self { prefix: Some(prefix.into()), local: Arc::clone(&self.local) }
    }
}

impl From<&str> for NameTest {
    fn from(value: &str) -> Self {
        match value.split_once(':') {
            Some((prefix, local)) => NameTest::prefixed(prefix, local),
            None => NameTest::new(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    axis: Axis,
    test: Option<NameTest>,
    predicates: Vec<Expr>,
}

impl Step {
    pub fn new(axis: Axis, test: Option<NameTest>) -> Self {
        Self { axis, test, predicates: Vec::new() }
    }

    pub fn child(name: impl Into<NameTest>) -> Self {
        Self::new(Axis::Child, Some(name.into()))
    }

    /// `*`
    pub fn any_child() -> Self {
        Self::new(Axis::Child, None)
    }

    /// `..`
    pub fn parent() -> Self {
        Self::new(Axis::Parent, None)
    }

    /// `.`
    pub fn context() -> Self {
        Self::new(Axis::SelfNode, None)
    }

    pub fn with_predicate(mut self, predicate: Expr) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn with_predicates(mut self, predicates: Vec<Expr>) -> Self {
        self.predicates = predicates;
        self
    }

    pub fn with_test(mut self, test: Option<NameTest>) -> Self {
        self.test = test;
        self
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn test(&self) -> Option<&NameTest> {
        self.test.as_ref()
    }

    pub fn predicates(&self) -> &[Expr] {
        &self.predicates
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    absolute: bool,
    steps: Vec<Step>,
}

impl LocationPath {
    pub fn relative(steps: Vec<Step>) -> Self {
        Self { absolute: false, steps }
    }

    pub fn absolute(steps: Vec<Step>) -> Self {
        Self { absolute: true, steps }
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn with_steps(&self, steps: Vec<Step>) -> Self {
        Self { absolute: self.absolute, steps }
    }

    pub fn leading_parent_steps(&self) -> usize {
        if self.absolute {
            return 0;
        }
        self.steps.iter().take_while(|step| step.axis() == Axis::Parent).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Union,
}

impl BinaryOp {
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::Or | BinaryOp::And)
    }

    pub fn is_relational(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "div",
            BinaryOp::Mod => "mod",
            BinaryOp::Union => "|",
        }
    }

    pub(crate) fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 6,
            BinaryOp::Union => 7,
        }
    }
}

/// XPath 1.0 core library functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Last,
    Position,
    Count,
    LocalName,
    NamespaceUri,
    Name,
    String,
    Concat,
    StartsWith,
    Contains,
    SubstringBefore,
    SubstringAfter,
    Substring,
    StringLength,
    NormalizeSpace,
    Translate,
    Boolean,
    Not,
    True,
    False,
    Lang,
    Number,
    Sum,
    Floor,
    Ceiling,
    Round,
    Current,
}

impl Function {
    const ALL: [Function; 27] = [
        Function::Last,
        Function::Position,
        Function::Count,
        Function::LocalName,
        Function::NamespaceUri,
        Function::Name,
        Function::String,
        Function::Concat,
        Function::StartsWith,
        Function::Contains,
        Function::SubstringBefore,
        Function::SubstringAfter,
        Function::Substring,
        Function::StringLength,
        Function::NormalizeSpace,
        Function::Translate,
        Function::Boolean,
        Function::Not,
        Function::True,
        Function::False,
        Function::Lang,
        Function::Number,
        Function::Sum,
        Function::Floor,
        Function::Ceiling,
        Function::Round,
        Function::Current,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Last => "last",
            Function::Position => "position",
            Function::Count => "count",
            Function::LocalName => "local-name",
            Function::NamespaceUri => "namespace-uri",
            Function::Name => "name",
            Function::String => "string",
            Function::Concat => "concat",
            Function::StartsWith => "starts-with",
            Function::Contains => "contains",
            Function::SubstringBefore => "substring-before",
            Function::SubstringAfter => "substring-after",
            Function::Substring => "substring",
            Function::StringLength => "string-length",
            Function::NormalizeSpace => "normalize-space",
            Function::Translate => "translate",
            Function::Boolean => "boolean",
            Function::Not => "not",
            Function::True => "true",
            Function::False => "false",
            Function::Lang => "lang",
            Function::Number => "number",
            Function::Sum => "sum",
            Function::Floor => "floor",
            Function::Ceiling => "ceiling",
            Function::Round => "round",
            Function::Current => "current",
        }
    }

    /// Functions whose optional single argument defaults to the context node.
    pub fn defaults_to_context(self) -> bool {
        matches!(
            self,
            Function::LocalName
                | Function::NamespaceUri
                | Function::Name
                | Function::String
                | Function::StringLength
                | Function::NormalizeSpace
                | Function::Number
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Path(LocationPath),
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Negate(Box<Expr>),
    Call { func: Function, args: Vec<Expr> },
    Extension { name: Arc<str>, args: Vec<Expr> },
    /// A primary expression followed by predicates and further steps,
    /// e.g. `current()/../name` or `deref(.)/../mtu`.
    Filter { base: Box<Expr>, predicates: Vec<Expr>, steps: Vec<Step> },
}

impl Expr {
    pub fn string(value: impl Into<Arc<str>>) -> Self {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn number(value: f64) -> Self {
        Expr::Literal(Literal::Number(value))
    }

    pub fn relative(steps: Vec<Step>) -> Self {
        Expr::Path(LocationPath::relative(steps))
    }

    pub fn absolute(steps: Vec<Step>) -> Self {
        Expr::Path(LocationPath::absolute(steps))
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::And, left, right)
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Or, left, right)
    }

    pub fn equals(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Eq, left, right)
    }

    pub fn call(func: Function, args: Vec<Expr>) -> Self {
        Expr::Call { func, args }
    }

    pub fn current() -> Self {
        Expr::Call { func: Function::Current, args: Vec::new() }
    }

    pub fn extension(name: impl Into<Arc<str>>, args: Vec<Expr>) -> Self {
        Expr::Extension { name: name.into(), args }
    }

    pub fn filter(base: Expr, predicates: Vec<Expr>, steps: Vec<Step>) -> Self {
        Expr::Filter { base: Box::new(base), predicates, steps }
    }

    pub fn is_current(&self) -> bool {
        matches!(self, Expr::Call { func: Function::Current, args } if args.is_empty())
    }

    /// `current()` anywhere in the tree, predicates included.
    pub fn contains_current(&self) -> bool {
        match self {
            Expr::Literal(_) => false,
            Expr::Path(path) => path.steps().iter().any(|s| s.predicates().iter().any(Expr::contains_current)),
            Expr::Binary { left, right, .. } => left.contains_current() || right.contains_current(),
            Expr::Negate(inner) => inner.contains_current(),
            Expr::Call { func: Function::Current, .. } => true,
            Expr::Call { args, .. } | Expr::Extension { args, .. } => args.iter().any(Expr::contains_current),
            Expr::Filter { base, predicates, steps } => {
                base.contains_current()
                    || predicates.iter().any(Expr::contains_current)
                    || steps.iter().any(|s| s.predicates().iter().any(Expr::contains_current))
            }
        }
    }
}
