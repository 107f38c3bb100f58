use crate::value::EvalResult;

#[allow(clippy::cast_precision_loss)]
pub(super) fn from_usize(n: usize) -> EvalResult {
    EvalResult::number(n as f64)
}

/// Nearest integer, ties towards positive infinity.
pub(super) fn round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        return n;
    }
    (n + 0.5).floor()
}

pub(super) fn sum(values: Option<&EvalResult>) -> f64 {
    match values {
        Some(EvalResult::NodeSet(items)) => items.iter().filter_map(|item| item.scalar()).map(|value| value.to_number()).sum(),
        Some(EvalResult::Absent) | None => 0.0,
        Some(other) => other.to_number(),
    }
}
