//! Numbers embedded in formatted strings such as `"Subtotal=123.45"`.

use std::sync::LazyLock;

use regex::Regex;

use crate::row::SqlValue;

static LABELLED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(\w+)\s*=\s*(-?\d+(?:\.\d+)?|-?\.\d+)?").ok());

/// Returns the first decimal number following `<label>=` in `text`.
///
/// The label must be a whole word, whitespace around `=` is tolerated and
/// matching is case-sensitive. A missing text, label or number yields `0.0`.
pub fn parse_labelled_number(text: Option<&str>, label: &str) -> f64 {
    let (Some(text), Some(re)) = (text, LABELLED.as_ref()) else {
        return 0.0;
    };
    re.captures_iter(text)
        .filter(|c| c.get(1).is_some_and(|l| l.as_str() == label))
        .find_map(|c| c.get(2)?.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// [`parse_labelled_number`] over a column value. A column that already
/// holds a number is taken as is.
pub fn labelled_value(value: &SqlValue, label: &str) -> f64 {
    match value {
        SqlValue::Int(_) | SqlValue::Float(_) => value.as_f64().unwrap_or(0.0),
        other => parse_labelled_number(other.as_str(), label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_value_after_label() {
        assert_eq!(parse_labelled_number(Some("Total=1500.00"), "Total"), 1500.0);
        assert_eq!(parse_labelled_number(Some("IVA = 18"), "IVA"), 18.0);
        assert_eq!(
            parse_labelled_number(Some("Subtotal=10.5; IVA=1.26"), "IVA"),
            1.26
        );
    }

    #[test]
    fn missing_label_or_number_is_zero() {
        assert_eq!(parse_labelled_number(Some("Subtotal=12.00"), "Total"), 0.0);
        assert_eq!(parse_labelled_number(Some("Total="), "Total"), 0.0);
        assert_eq!(parse_labelled_number(Some(""), "Total"), 0.0);
        assert_eq!(parse_labelled_number(None, "Total"), 0.0);
    }

    #[test]
    fn label_must_match_a_whole_word() {
        let text = Some("Subtotal=100.00 Total=115.00");
        assert_eq!(parse_labelled_number(text, "Total"), 115.0);
        assert_eq!(parse_labelled_number(text, "Subtotal"), 100.0);
        assert_eq!(parse_labelled_number(Some("Subtotal=100.00"), "Total"), 0.0);
    }

    #[test]
    fn numeric_column_passes_through() {
        assert_eq!(labelled_value(&SqlValue::Float(9.75), "Total"), 9.75);
        assert_eq!(labelled_value(&SqlValue::from("Total=3.5"), "Total"), 3.5);
        assert_eq!(labelled_value(&SqlValue::Null, "Total"), 0.0);
    }
}
