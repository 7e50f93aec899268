//! Number formatting for metric boxes, tables, and the assistant digest.

/// Renders `value` with thousands separators and a fixed number of
/// decimals: `thousands(1234567.891, 2)` is `"1,234,567.89"`.
pub fn thousands(value: f64, decimals: usize) -> String {
    let rendered = format!("{value:.decimals$}");
    let (raw, negative) = match rendered.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (rendered.as_str(), false),
    };
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw, None),
    };

    let mut grouped = String::with_capacity(raw.len() + int_part.len() / 3 + 1);
    if negative {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::thousands;

    #[test]
    fn groups_digits_in_threes() {
        assert_eq!(thousands(0.0, 0), "0");
        assert_eq!(thousands(950.0, 0), "950");
        assert_eq!(thousands(1_234.0, 0), "1,234");
        assert_eq!(thousands(1_234_567.891, 2), "1,234,567.89");
    }

    #[test]
    fn keeps_requested_decimals() {
        assert_eq!(thousands(12.0, 2), "12.00");
        assert_eq!(thousands(0.456, 2), "0.46");
    }

    #[test]
    fn carries_the_sign_outside_the_grouping() {
        assert_eq!(thousands(-1_234.5, 2), "-1,234.50");
    }
}
