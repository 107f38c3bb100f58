/// XPath 1.0 number-to-string conversion.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity".to_owned() } else { "-Infinity".to_owned() };
    }
    if value == 0.0 {
        return "0".to_owned();
    }
    if value.fract() == 0.0 && value.abs() < 1e18 {
        #[allow(clippy::cast_possible_truncation)]
        return format!("{}", value as i64);
    }
    format!("{value}")
}

/// XPath 1.0 string-to-number conversion: optional whitespace, an optional
/// minus sign, digits with at most one decimal point. Anything else is NaN.
pub fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for ch in digits.chars() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return f64::NAN,
        }
    }
    if !seen_digit {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, "0")]
    #[case(-0.0, "0")]
    #[case(5.0, "5")]
    #[case(-1.0, "-1")]
    #[case(2.5, "2.5")]
    #[case(f64::NAN, "NaN")]
    #[case(f64::INFINITY, "Infinity")]
    fn numbers_render_like_xpath(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_number(value), expected);
    }

    #[rstest]
    #[case(" 42 ", 42.0)]
    #[case("-1.5", -1.5)]
    #[case(".5", 0.5)]
    #[case("7.", 7.0)]
    fn numeric_strings_parse(#[case] text: &str, #[case] expected: f64) {
        assert!((parse_number(text) - expected).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("1e3")]
    #[case("inf")]
    #[case("NaN")]
    #[case("1.2.3")]
    #[case("-")]
    fn non_numeric_strings_are_nan(#[case] text: &str) {
        assert!(parse_number(text).is_nan());
    }
}
