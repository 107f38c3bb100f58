use super::numeric::round;

pub(super) fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(super) fn before(text: &str, pattern: &str) -> String {
    text.split_once(pattern).map(|(head, _)| head.to_owned()).unwrap_or_default()
}

pub(super) fn after(text: &str, pattern: &str) -> String {
    text.split_once(pattern).map(|(_, tail)| tail.to_owned()).unwrap_or_default()
}

/// Characters at rounded positions `start <= p < start + length`, counting
/// from one.
#[allow(clippy::cast_precision_loss)]
pub(super) fn substring(text: &str, start: f64, length: Option<f64>) -> String {
    let first = round(start);
    let end = length.map_or(f64::INFINITY, |length| first + round(length));
    text.chars()
        .enumerate()
        .filter(|(index, _)| {
            let position = (index + 1) as f64;
            position >= first && position < end
        })
        .map(|(_, c)| c)
        .collect()
}

/// Maps each character found in `from` to the one at the same index in `to`;
/// characters past the end of `to` are removed.
pub(super) fn translate(text: &str, from: &str, to: &str) -> String {
    let to: Vec<char> = to.chars().collect();
    text.chars()
        .filter_map(|c| match from.chars().position(|f| f == c) {
            Some(index) => to.get(index).copied(),
            None => Some(c),
        })
        .collect()
}
