//! Canonical form of constraint expressions.
//!
//! Normalization never mutates its input; every rewrite builds a new tree.
//! It performs three rewrites:
//!
//! * `list[current()]` becomes `list[key = current()]` using the first key of
//!   the list (steps whose list has no key are kept as written),
//! * relational operands rooted at `current()` are replaced by the literal
//!   they evaluate to, when a binding is supplied and yields one,
//! * unqualified child steps get the state-data prefix while a state pass is
//!   running.
//!
//! Applying the normalizer twice yields the same tree as applying it once.

use crate::names::resolve_child;
use tracing::trace;
use yangval_core::{Axis, Expr, Literal, LocationPath, NameTest, SchemaNavigator, SchemaNodeKind, SchemaPath, Step};

/// Evaluates a `current()`-rooted expression to a literal, if it has one.
pub type CurrentBinding<'a> = &'a dyn Fn(&Expr) -> Option<Literal>;

pub struct Normalizer<'a> {
    navigator: &'a dyn SchemaNavigator,
    origin: SchemaPath,
    default_namespace: String,
    state_prefix: Option<String>,
    bind_current: Option<CurrentBinding<'a>>,
}

impl<'a> Normalizer<'a> {
    /// `origin` is the schema node `current()` refers to; its namespace is
    /// used for unqualified names.
    pub fn new(navigator: &'a dyn SchemaNavigator, origin: SchemaPath) -> Self {
        let default_namespace = origin.last().map(|name| name.namespace().to_owned()).unwrap_or_default();
        Self { navigator, origin, default_namespace, state_prefix: None, bind_current: None }
    }

    pub fn with_state_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.state_prefix = Some(prefix.into());
        self
    }

    pub fn with_current_binding(mut self, bind: CurrentBinding<'a>) -> Self {
        self.bind_current = Some(bind);
        self
    }

    pub fn normalize(&self, expr: &Expr) -> Expr {
        let normalized = self.expr(expr, Some(&self.origin));
        trace!(before = %expr, after = %normalized, "normalized");
        normalized
    }

    fn expr(&self, expr: &Expr, context: Option<&SchemaPath>) -> Expr {
        match expr {
            Expr::Literal(_) => expr.clone(),
            Expr::Path(path) => Expr::Path(self.location_path(path, context)),
            Expr::Binary { op, left, right } if op.is_relational() => {
                let left = self.bind(left).unwrap_or_else(|| self.expr(left, context));
                let right = self.bind(right).unwrap_or_else(|| self.expr(right, context));
                Expr::binary(*op, left, right)
            }
            Expr::Binary { op, left, right } => Expr::binary(*op, self.expr(left, context), self.expr(right, context)),
            Expr::Negate(inner) => Expr::Negate(Box::new(self.expr(inner, context))),
            Expr::Call { func, args } => Expr::call(*func, self.exprs(args, context)),
            Expr::Extension { name, args } => Expr::Extension { name: name.clone(), args: self.exprs(args, context) },
            Expr::Filter { base, predicates, steps } => {
                let start = base.is_current().then(|| self.origin.clone());
                Expr::filter(
                    self.expr(base, context),
                    self.exprs(predicates, start.as_ref()),
                    self.steps(steps, start),
                )
            }
        }
    }

    fn exprs(&self, exprs: &[Expr], context: Option<&SchemaPath>) -> Vec<Expr> {
        exprs.iter().map(|expr| self.expr(expr, context)).collect()
    }

    fn bind(&self, operand: &Expr) -> Option<Expr> {
        let bind = self.bind_current?;
        let rooted_at_current = match operand {
            Expr::Filter { base, .. } => base.is_current(),
            other => other.is_current(),
        };
        if !rooted_at_current {
            return None;
        }
        bind(operand).map(Expr::Literal)
    }

    fn location_path(&self, path: &LocationPath, context: Option<&SchemaPath>) -> LocationPath {
        let start = if path.is_absolute() { Some(SchemaPath::root()) } else { context.cloned() };
        path.with_steps(self.steps(path.steps(), start))
    }

    fn steps(&self, steps: &[Step], mut at: Option<SchemaPath>) -> Vec<Step> {
        let mut out = Vec::with_capacity(steps.len());
        for step in steps {
            at = at.and_then(|path| self.advance(&path, step));
            out.push(self.step(step, at.as_ref()));
        }
        out
    }

    fn advance(&self, from: &SchemaPath, step: &Step) -> Option<SchemaPath> {
        match step.axis() {
            Axis::SelfNode => Some(from.clone()),
            Axis::Parent => self.navigator.data_parent_of(from),
            Axis::Child => {
                let test = step.test()?;
                let node = resolve_child(self.navigator, from, test, &self.default_namespace)?;
                Some(node.path().clone())
            }
        }
    }

    fn step(&self, step: &Step, at: Option<&SchemaPath>) -> Step {
        let test = match (&self.state_prefix, step.axis(), step.test()) {
            (Some(prefix), Axis::Child, Some(test)) if test.prefix.is_none() => Some(test.with_prefix(prefix.as_str())),
            (_, _, test) => test.cloned(),
        };
        let predicates = step
            .predicates()
            .iter()
            .map(|predicate| {
                let rewritten = if predicate.is_current() { self.key_predicate(step, at) } else { None };
                self.expr(rewritten.as_ref().unwrap_or(predicate), at)
            })
            .collect();
        step.clone().with_test(test).with_predicates(predicates)
    }

    /// `key = current()` for a list step, using the list's first key.
    fn key_predicate(&self, step: &Step, at: Option<&SchemaPath>) -> Option<Expr> {
        let node = self.navigator.data_node_at(at?)?;
        if node.kind() != SchemaNodeKind::List {
            return None;
        }
        let key = node.first_key()?;
        let test = match step.test().and_then(|test| test.prefix.clone()) {
            Some(prefix) => NameTest::prefixed(prefix, key.local()),
            None => NameTest::new(key.local()),
        };
        Some(Expr::equals(Expr::relative(vec![Step::child(test)]), Expr::current()))
    }
}
