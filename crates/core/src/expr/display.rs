use super::number::format_number;
use super::{Axis, Expr, Literal, LocationPath, NameTest, Step};
use std::fmt;

impl fmt::Display for NameTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.axis, &self.test) {
            (Axis::Child, Some(test)) => write!(f, "{test}")?,
            (Axis::Child, None) => f.write_str("*")?,
            (Axis::Parent, None) => f.write_str("..")?,
            (Axis::Parent, Some(test)) => write!(f, "parent::{test}")?,
            (Axis::SelfNode, None) => f.write_str(".")?,
            (Axis::SelfNode, Some(test)) => write!(f, "self::{test}")?,
        }
        for predicate in &self.predicates {
            write!(f, "[{predicate}]")?;
        }
        Ok(())
    }
}

fn write_steps(f: &mut fmt::Formatter<'_>, steps: &[Step]) -> fmt::Result {
    for (i, step) in steps.iter().enumerate() {
        if i > 0 {
            f.write_str("/")?;
        }
        write!(f, "{step}")?;
    }
    Ok(())
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        } else if self.steps.is_empty() {
            return f.write_str(".");
        }
        write_steps(f, &self.steps)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) if s.contains('\'') => write!(f, "\"{s}\""),
            Literal::String(s) => write!(f, "'{s}'"),
            Literal::Number(n) => f.write_str(&format_number(*n)),
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Expr, parent_precedence: u8) -> fmt::Result {
    match operand {
        Expr::Binary { op, .. } if op.precedence() < parent_precedence => write!(f, "({operand})"),
        _ => write!(f, "{operand}"),
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, name: &str, args: &[Expr]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    f.write_str(")")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(literal) => write!(f, "{literal}"),
            Expr::Path(path) => write!(f, "{path}"),
            Expr::Binary { op, left, right } => {
                write_operand(f, left, op.precedence())?;
                write!(f, " {} ", op.symbol())?;
                // Right operand binds one level tighter to keep left associativity visible.
                write_operand(f, right, op.precedence() + 1)
            }
            Expr::Negate(inner) => {
                f.write_str("-")?;
                write_operand(f, inner, u8::MAX)
            }
            Expr::Call { func, args } => write_args(f, func.name(), args),
            Expr::Extension { name, args } => write_args(f, name, args),
            Expr::Filter { base, predicates, steps } => {
                match base.as_ref() {
                    Expr::Call { .. } | Expr::Extension { .. } | Expr::Literal(_) => write!(f, "{base}")?,
                    other => write!(f, "({other})")?,
                }
                for predicate in predicates {
                    write!(f, "[{predicate}]")?;
                }
                if !steps.is_empty() {
                    f.write_str("/")?;
                    write_steps(f, steps)?;
                }
                Ok(())
            }
        }
    }
}
