//! Logical, relational, arithmetic and union operators.

use super::{EvalOutcome, Evaluator, Focus};
use crate::value::{EvalResult, Item, scalar_to_bool};
use itertools::Itertools;
use std::collections::BTreeSet;
use yangval_core::{BinaryOp, Expr, Scalar, parse_number};

impl Evaluator<'_> {
    /// `and` stops at a false or absent left side; `or` stops at a true one
    /// unless it is a multi-valued leaf set that may take part in a set
    /// comparison.
    pub(super) fn logical(&mut self, op: BinaryOp, left: &Expr, right: &Expr, focus: &Focus) -> EvalOutcome {
        let left = self.eval(left, focus)?;
        if op == BinaryOp::And {
            if left.is_absent() {
                return Ok(EvalResult::Absent);
            }
            if !left.to_bool() {
                return Ok(EvalResult::Bool(false));
            }
            let right = self.eval(right, focus)?;
            if let Some(equal) = set_equality(&left, &right) {
                return Ok(EvalResult::Bool(equal));
            }
            if right.is_absent() {
                return Ok(EvalResult::Absent);
            }
            return Ok(EvalResult::Bool(right.to_bool()));
        }
        if left.to_bool() && !is_multi_leaf_set(&left) {
            return Ok(EvalResult::Bool(true));
        }
        let right = self.eval(right, focus)?;
        if let Some(equal) = set_equality(&left, &right) {
            return Ok(EvalResult::Bool(equal));
        }
        if left.to_bool() || right.to_bool() {
            return Ok(EvalResult::Bool(true));
        }
        if left.is_absent() || right.is_absent() {
            return Ok(EvalResult::Absent);
        }
        Ok(EvalResult::Bool(false))
    }
}

fn is_multi_leaf_set(value: &EvalResult) -> bool {
    let items = value.items();
    items.len() > 1 && items.iter().all(|item| matches!(item, Item::Leaf { .. }))
}

fn is_leaf_set(value: &EvalResult) -> bool {
    matches!(value, EvalResult::NodeSet(items) if items.iter().all(|item| matches!(item, Item::Leaf { .. })))
}

/// Two leaf sets, at least one holding several values, combined by a logical
/// operator compare as sets of values.
fn set_equality(left: &EvalResult, right: &EvalResult) -> Option<bool> {
    if !(is_leaf_set(left) && is_leaf_set(right)) {
        return None;
    }
    if !(is_multi_leaf_set(left) || is_multi_leaf_set(right)) {
        return None;
    }
    let values = |value: &EvalResult| value.leaf_values().into_iter().collect::<BTreeSet<_>>();
    Some(values(left) == values(right))
}

/// XPath 1.0 comparison. Node-sets compare existentially; an absent
/// operand makes the comparison absent.
pub(super) fn compare(op: BinaryOp, left: &EvalResult, right: &EvalResult) -> EvalResult {
    if left.is_absent() || right.is_absent() {
        return EvalResult::Absent;
    }
    EvalResult::Bool(match (left, right) {
        (EvalResult::NodeSet(a), EvalResult::NodeSet(b)) => a
            .iter()
            .filter_map(Item::string_value)
            .cartesian_product(b.iter().filter_map(Item::string_value).collect::<Vec<_>>())
            .any(|(x, y)| compare_strings(op, &x, &y)),
        (EvalResult::NodeSet(items), other) => compare_set(op, items, other),
        (other, EvalResult::NodeSet(items)) => compare_set(flip(op), items, other),
        (a, b) => compare_atoms(op, a, b),
    })
}

fn compare_set(op: BinaryOp, items: &[Item], other: &EvalResult) -> bool {
    if let Some(b) = as_bool(other) {
        return compare_atoms(op, &EvalResult::Bool(!items.is_empty()), &EvalResult::Bool(b));
    }
    let numeric = matches!(other, EvalResult::Scalar(Scalar::Number(_))) || !is_equality(op);
    items.iter().filter_map(Item::string_value).any(|value| {
        if numeric {
            compare_numbers(op, parse_number(&value), other.to_number())
        } else {
            compare_strings(op, &value, &other.to_text().unwrap_or_default())
        }
    })
}

fn compare_atoms(op: BinaryOp, left: &EvalResult, right: &EvalResult) -> bool {
    if is_equality(op) {
        if as_bool(left).is_some() || as_bool(right).is_some() {
            let equal = left.to_bool() == right.to_bool();
            return if op == BinaryOp::Eq { equal } else { !equal };
        }
        let numeric = [left, right].iter().any(|value| matches!(value, EvalResult::Scalar(Scalar::Number(_))));
        if !numeric {
            return compare_strings(op, &left.to_text().unwrap_or_default(), &right.to_text().unwrap_or_default());
        }
    }
    compare_numbers(op, left.to_number(), right.to_number())
}

fn compare_strings(op: BinaryOp, left: &str, right: &str) -> bool {
    match op {
        BinaryOp::Eq => left == right,
        BinaryOp::Ne => left != right,
        _ => compare_numbers(op, parse_number(left), parse_number(right)),
    }
}

fn compare_numbers(op: BinaryOp, left: f64, right: f64) -> bool {
    match op {
        BinaryOp::Eq => left == right,
        BinaryOp::Ne => left != right,
        BinaryOp::Lt => left < right,
        BinaryOp::Le => left <= right,
        BinaryOp::Gt => left > right,
        BinaryOp::Ge => left >= right,
        _ => false,
    }
}

fn as_bool(value: &EvalResult) -> Option<bool> {
    match value {
        EvalResult::Bool(b) => Some(*b),
        EvalResult::Scalar(scalar @ Scalar::Boolean(_)) => Some(scalar_to_bool(scalar)),
        _ => None,
    }
}

fn is_equality(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::Eq | BinaryOp::Ne)
}

/// Operator to use once the operands swap sides.
fn flip(op: BinaryOp) -> BinaryOp {
    match op {
        BinaryOp::Lt => BinaryOp::Gt,
        BinaryOp::Le => BinaryOp::Ge,
        BinaryOp::Gt => BinaryOp::Lt,
        BinaryOp::Ge => BinaryOp::Le,
        other => other,
    }
}

pub(super) fn arithmetic(op: BinaryOp, left: &EvalResult, right: &EvalResult) -> EvalResult {
    if left.is_absent() || right.is_absent() {
        return EvalResult::Absent;
    }
    let (a, b) = (left.to_number(), right.to_number());
    EvalResult::number(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        _ => f64::NAN,
    })
}

pub(super) fn union(left: EvalResult, right: EvalResult) -> EvalResult {
    if left.is_absent() && right.is_absent() {
        return EvalResult::Absent;
    }
    EvalResult::NodeSet(left.into_items().into_iter().chain(right.into_items()).unique_by(Item::id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BinaryOp::Eq, EvalResult::number(1.0), EvalResult::string("1"), true)]
    #[case(BinaryOp::Eq, EvalResult::string("1.0"), EvalResult::string("1"), false)]
    #[case(BinaryOp::Ne, EvalResult::string("a"), EvalResult::string("b"), true)]
    #[case(BinaryOp::Lt, EvalResult::string("2"), EvalResult::number(10.0), true)]
    #[case(BinaryOp::Eq, EvalResult::Bool(true), EvalResult::string("x"), true)]
    #[case(BinaryOp::Eq, EvalResult::Scalar(Scalar::Boolean(false)), EvalResult::string(""), true)]
    #[case(BinaryOp::Ge, EvalResult::number(f64::NAN), EvalResult::number(1.0), false)]
    fn atomic_comparisons(#[case] op: BinaryOp, #[case] left: EvalResult, #[case] right: EvalResult, #[case] expected: bool) {
        assert_eq!(compare(op, &left, &right), expected, "{left:?} {} {right:?}", op.symbol());
    }

    #[rstest]
    #[case(BinaryOp::Eq)]
    #[case(BinaryOp::Lt)]
    #[case(BinaryOp::Ne)]
    fn absent_operand_is_absent(#[case] op: BinaryOp) {
        assert!(compare(op, &EvalResult::Absent, &EvalResult::number(1.0)).is_absent());
        assert!(compare(op, &EvalResult::string("x"), &EvalResult::Absent).is_absent());
    }

    #[rstest]
    fn empty_node_set_never_compares_equal() {
        let empty = EvalResult::NodeSet(Vec::new());
        assert_eq!(compare(BinaryOp::Eq, &empty, &EvalResult::string("")), false);
        assert_eq!(compare(BinaryOp::Ne, &empty, &EvalResult::string("")), false);
        assert_eq!(compare(BinaryOp::Eq, &empty, &EvalResult::Bool(false)), true);
    }

    #[rstest]
    #[case(BinaryOp::Mod, 7.0, 3.0, 1.0)]
    #[case(BinaryOp::Mod, -7.0, 3.0, -1.0)]
    #[case(BinaryOp::Div, 1.0, 4.0, 0.25)]
    #[case(BinaryOp::Sub, 2.0, 5.0, -3.0)]
    fn arithmetic_follows_ieee(#[case] op: BinaryOp, #[case] a: f64, #[case] b: f64, #[case] expected: f64) {
        let result = arithmetic(op, &EvalResult::number(a), &EvalResult::number(b));
        assert_eq!(result.to_number(), expected);
    }

    #[rstest]
    fn arithmetic_on_absent_is_absent() {
        assert!(arithmetic(BinaryOp::Add, &EvalResult::Absent, &EvalResult::number(1.0)).is_absent());
    }

    #[rstest]
    fn union_of_absent_sides_is_absent() {
        assert!(union(EvalResult::Absent, EvalResult::Absent).is_absent());
        assert_eq!(union(EvalResult::Absent, EvalResult::NodeSet(Vec::new())).items().len(), 0);
    }
}
