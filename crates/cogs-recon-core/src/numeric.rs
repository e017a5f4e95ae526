use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::error::ReconError;
use crate::ReconResult;

/// Number of fraction digits every reported quantity carries.
pub const REPORT_SCALE: u32 = 2;

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Clean a raw scalar pulled out of an API response.
///
/// - `null` yields `None`.
/// - JSON numbers pass through unchanged.
/// - Text is trimmed, accounting-style parentheses become a leading minus,
///   and everything other than digits, `.` and `-` is dropped. Text with no
///   numeric characters left yields `None`.
/// - Any other value (booleans, objects, arrays) is returned as-is and left
///   for [`to_decimal`] to accept or reject.
///
/// No decimal parsing happens here; the result is a string the caller can
/// hand to an exact decimal constructor.
pub fn normalize_numeric(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Number(_) => Some(value.clone()),
        Value::String(text) => normalize_text(text).map(Value::String),
        other => Some(other.clone()),
    }
}

/// Text half of [`normalize_numeric`]: `"(1,200)"` becomes `"-1200"`,
/// `"$ 1,000.50"` becomes `"1000.50"`.
pub fn normalize_text(text: &str) -> Option<String> {
    let mut body = text.trim();

    let negative = body.len() >= 2 && body.starts_with('(') && body.ends_with(')');
    if negative {
        body = body[1..body.len() - 1].trim();
    }

    let cleaned: String = body
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    if negative {
        Some(format!("-{cleaned}"))
    } else {
        Some(cleaned)
    }
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Coerce an extracted value into an exact decimal.
///
/// Missing and empty values count as zero. A non-empty value that does not
/// parse is an [`ReconError::InvalidNumericValue`] naming `field`.
///
/// [`Decimal`] holds 96-bit integers scaled by up to 28 places, so magnitudes
/// beyond about 7.9e28 (for example the JSON number `1e30`) are rejected with
/// the same error rather than rounded.
pub fn to_decimal(field: &str, raw: Option<&Value>) -> ReconResult<Decimal> {
    let Some(raw) = raw else {
        return Ok(Decimal::ZERO);
    };

    match raw {
        Value::Null | Value::Bool(false) => Ok(Decimal::ZERO),
        Value::Number(n) => parse_decimal(&n.to_string()).ok_or_else(|| invalid(field, raw)),
        Value::String(s) if s.trim().is_empty() => Ok(Decimal::ZERO),
        Value::String(s) => parse_decimal(s.trim()).ok_or_else(|| invalid(field, raw)),
        Value::Array(items) if items.is_empty() => Ok(Decimal::ZERO),
        Value::Object(map) if map.is_empty() => Ok(Decimal::ZERO),
        _ => Err(invalid(field, raw)),
    }
}

/// Parse plain or scientific decimal notation without going through f64.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn invalid(field: &str, raw: &Value) -> ReconError {
    let value = match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    ReconError::InvalidNumericValue {
        field: field.to_string(),
        value,
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Round half away from zero to two places and render with exactly two
/// fraction digits: `80.555` gives `"80.56"`, `80` gives `"80.00"`.
pub fn format_currency(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(REPORT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        // drop the sign of a negative value that rounded away
        rounded = Decimal::ZERO;
    }
    rounded.rescale(REPORT_SCALE);
    rounded.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parentheses_become_negative() {
        assert_eq!(normalize_text("(1,200)"), Some("-1200".to_string()));
        assert_eq!(normalize_text(" ( 45.10 ) "), Some("-45.10".to_string()));
    }

    #[test]
    fn test_thousands_separators_stripped() {
        assert_eq!(normalize_text("1,000"), Some("1000".to_string()));
        assert_eq!(normalize_text("$ 2,500.75"), Some("2500.75".to_string()));
    }

    #[test]
    fn test_text_without_digits_is_none() {
        assert_eq!(normalize_text("n/a"), None);
        assert_eq!(normalize_text("   "), None);
        assert_eq!(normalize_text("()"), None);
    }

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(normalize_numeric(&json!(120)), Some(json!(120)));
        assert_eq!(normalize_numeric(&json!(80.555)), Some(json!(80.555)));
        assert_eq!(normalize_numeric(&Value::Null), None);
    }

    #[test]
    fn test_non_scalar_returned_unchanged() {
        assert_eq!(normalize_numeric(&json!(true)), Some(json!(true)));
        assert_eq!(normalize_numeric(&json!({"a": 1})), Some(json!({"a": 1})));
    }

    #[test]
    fn test_to_decimal_missing_is_zero() {
        assert_eq!(to_decimal("inventory", None).unwrap(), Decimal::ZERO);
        assert_eq!(to_decimal("inventory", Some(&Value::Null)).unwrap(), Decimal::ZERO);
        assert_eq!(to_decimal("inventory", Some(&json!(""))).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_to_decimal_exact_from_float() {
        let d = to_decimal("cost_of_revenue", Some(&json!(80.555))).unwrap();
        assert_eq!(d, dec!(80.555));
    }

    #[test]
    fn test_to_decimal_from_text() {
        assert_eq!(to_decimal("x", Some(&json!("-1200"))).unwrap(), dec!(-1200));
        assert_eq!(to_decimal("x", Some(&json!("15.876"))).unwrap(), dec!(15.876));
    }

    #[test]
    fn test_to_decimal_rejects_garbage() {
        let err = to_decimal("cwip_opening", Some(&json!("1.2.3"))).unwrap_err();
        match err {
            ReconError::InvalidNumericValue { field, value } => {
                assert_eq!(field, "cwip_opening");
                assert_eq!(value, "1.2.3");
            }
            other => panic!("Expected InvalidNumericValue, got {other:?}"),
        }
        assert!(to_decimal("x", Some(&json!(true))).is_err());
        assert!(to_decimal("x", Some(&json!({"value": 3}))).is_err());
    }

    #[test]
    fn test_to_decimal_range_limit() {
        let max = to_decimal("x", Some(&json!("79228162514264337593543950335"))).unwrap();
        assert_eq!(max, Decimal::MAX);
        assert!(matches!(
            to_decimal("x", Some(&json!(1e30))),
            Err(ReconError::InvalidNumericValue { .. })
        ));
    }

    #[test]
    fn test_format_currency_half_up() {
        assert_eq!(format_currency(dec!(80.555)), "80.56");
        assert_eq!(format_currency(dec!(95.352)), "95.35");
        assert_eq!(format_currency(dec!(-2.345)), "-2.35");
    }

    #[test]
    fn test_format_currency_pads_fraction() {
        assert_eq!(format_currency(dec!(80)), "80.00");
        assert_eq!(format_currency(dec!(80.5)), "80.50");
        assert_eq!(format_currency(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_format_currency_negative_zero() {
        assert_eq!(format_currency(dec!(-0.001)), "0.00");
    }
}
