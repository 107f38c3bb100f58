//! Tree-walking evaluation of constraint expressions.

mod comparison;
mod count;
mod location;
mod state;

use super::Env;
use crate::context::ValidationContext;
use crate::value::{EvalResult, Item};
use std::fmt::Display;
use tracing::debug;
use yangval_core::{BinaryOp, ErrorPath, Expr, Literal, Scalar, ValidationError};

pub(crate) type EvalOutcome = Result<EvalResult, ValidationError>;

/// Context item together with its position in the node-set being filtered.
#[derive(Debug, Clone)]
pub(crate) struct Focus {
    pub item: Item,
    pub position: usize,
    pub size: usize,
}

impl Focus {
    pub(crate) fn single(item: Item) -> Self {
        Self { item, position: 1, size: 1 }
    }
}

/// Evaluates expressions for one constraint owner.
///
/// `origin` is what `current()` returns. Unqualified names resolve in the
/// namespace of the origin.
pub(crate) struct Evaluator<'a> {
    pub(super) env: Env<'a>,
    pub(super) ctx: &'a mut ValidationContext,
    pub(super) origin: Item,
    pub(super) default_namespace: String,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(env: Env<'a>, ctx: &'a mut ValidationContext, origin: Item) -> Self {
        let default_namespace = origin.name().namespace().to_owned();
        Self { env, ctx, origin, default_namespace }
    }

    pub(crate) fn evaluate(&mut self, expr: &Expr) -> EvalOutcome {
        let focus = Focus::single(self.origin.clone());
        self.eval(expr, &focus)
    }

    pub(super) fn eval(&mut self, expr: &Expr, focus: &Focus) -> EvalOutcome {
        match expr {
            Expr::Literal(Literal::String(s)) => Ok(EvalResult::Scalar(Scalar::String(s.clone()))),
            Expr::Literal(Literal::Number(n)) => Ok(EvalResult::number(*n)),
            Expr::Path(path) => self.location_path(path, focus),
            Expr::Binary { op, left, right } if op.is_logical() => self.logical(*op, left, right, focus),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, focus)?;
                let right = self.eval(right, focus)?;
                Ok(match op {
                    BinaryOp::Union => comparison::union(left, right),
                    op if op.is_relational() => comparison::compare(*op, &left, &right),
                    op => comparison::arithmetic(*op, &left, &right),
                })
            }
            Expr::Negate(inner) => match self.eval(inner, focus)? {
                EvalResult::Absent => Ok(EvalResult::Absent),
                value => Ok(EvalResult::number(-value.to_number())),
            },
            Expr::Call { func, args } => self.call(*func, args, focus),
            Expr::Extension { name, args } => self.extension(name, args, focus),
            Expr::Filter { base, predicates, steps } => {
                let base = self.eval(base, focus)?;
                if predicates.is_empty() && steps.is_empty() {
                    return Ok(base);
                }
                let EvalResult::NodeSet(items) = base else {
                    return Ok(EvalResult::Absent);
                };
                let items = self.apply_predicates(items, predicates)?;
                if items.is_empty() {
                    return Ok(EvalResult::NodeSet(items));
                }
                self.walk_steps(items, steps)
            }
        }
    }

    /// Runs `f` with `current()` temporarily bound to `origin`.
    pub(super) fn with_origin<T>(&mut self, origin: Item, f: impl FnOnce(&mut Self) -> T) -> T {
        let namespace = origin.name().namespace().to_owned();
        let saved_origin = std::mem::replace(&mut self.origin, origin);
        let saved_namespace = std::mem::replace(&mut self.default_namespace, namespace);
        let result = f(self);
        self.origin = saved_origin;
        self.default_namespace = saved_namespace;
        result
    }

    pub(super) fn error_path(&self) -> ErrorPath {
        self.origin.error_path()
    }

    /// A name that is not in the schema: an error under the strict policy,
    /// otherwise "no data".
    pub(super) fn unresolved(&self, reference: impl Display) -> Result<(), ValidationError> {
        if self.env.config.is_strict() {
            return Err(ValidationError::UnresolvedReference {
                path: self.error_path(),
                reference: reference.to_string(),
            });
        }
        debug!(reference = %reference, origin = %self.error_path(), "unresolved schema reference");
        Ok(())
    }
}
