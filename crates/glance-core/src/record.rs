//! Loosely-typed rows and the scalar coercion rules shared by every
//! consumer of a dataset.
//!
//! A row is an ordered field-name → JSON-scalar map. Cells are never
//! schema-checked up front; instead the helpers here define one consistent
//! coercion story (missing cell, `null`, number, string) that the
//! aggregator, shaper and insight heuristics all go through.

use serde_json::Value;

/// One row of a dataset. Key order is insertion order (`serde_json` is
/// built with `preserve_order`), which keeps export headers and first-row
/// field inspection stable.
pub type Record = serde_json::Map<String, Value>;

/// Build a record from literal pairs. Mostly useful in tests and demos.
pub fn record_from_pairs(pairs: &[(&str, Value)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Numeric coercion for a cell that may be absent.
///
/// Follows `Number(x)` semantics: numbers pass through, numeric-looking
/// strings parse, empty/blank strings and `null` coerce to 0, booleans map
/// to 0/1, anything else is NaN.
pub fn coerce_number(cell: Option<&Value>) -> f64 {
    match cell {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Some(_) => f64::NAN,
    }
}

/// Metric extraction: `coerce_number(..) || 0`. Non-numeric and missing
/// cells contribute 0 rather than being dropped, so group cardinality is
/// never affected by bad cells.
pub fn metric_value(cell: Option<&Value>) -> f64 {
    let n = coerce_number(cell);
    if n.is_nan() {
        0.0
    } else {
        n
    }
}

/// Group-key / display stringification of a cell, including the `"undefined"`
/// key produced by rows that lack the group-by field entirely.
pub fn display_string(cell: Option<&Value>) -> String {
    match cell {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => format_number(n.as_f64().unwrap_or(f64::NAN)),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render a float the way a display layer expects: integral values lose the
/// trailing `.0`, non-finite values keep their conventional names.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Render a float with thousands separators in the integer part, for the
/// canned report/assistant strings.
pub fn format_thousands(n: f64) -> String {
    if !n.is_finite() {
        return format_number(n);
    }
    let rounded = n.round();
    let negative = rounded < 0.0;
    let digits = format!("{}", rounded.abs() as i64);
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Whether a cell counts as missing for validation/cleaning purposes:
/// absent, `null`, or the empty string.
pub fn is_missing(cell: Option<&Value>) -> bool {
    match cell {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

/// Type-preserving identity key for deduplication: the number 1 and the
/// string "1" are distinct values and must stay distinct.
pub fn identity_key(cell: Option<&Value>) -> String {
    match cell {
        None => "u:".to_string(),
        Some(Value::Null) => "0:".to_string(),
        Some(Value::Bool(b)) => format!("b:{}", b),
        Some(Value::Number(n)) => format!("n:{}", n),
        Some(Value::String(s)) => format!("s:{}", s),
        Some(other) => format!("j:{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(Some(&json!(3.5))), 3.5);
        assert_eq!(coerce_number(Some(&json!("42"))), 42.0);
        assert_eq!(coerce_number(Some(&json!(""))), 0.0);
        assert_eq!(coerce_number(Some(&json!(null))), 0.0);
        assert!(coerce_number(Some(&json!("abc"))).is_nan());
        assert!(coerce_number(None).is_nan());
    }

    #[test]
    fn test_metric_value_defaults_to_zero() {
        assert_eq!(metric_value(Some(&json!("abc"))), 0.0);
        assert_eq!(metric_value(None), 0.0);
        assert_eq!(metric_value(Some(&json!(7))), 7.0);
    }

    #[test]
    fn test_display_string() {
        assert_eq!(display_string(None), "undefined");
        assert_eq!(display_string(Some(&json!(null))), "null");
        assert_eq!(display_string(Some(&json!(1.0))), "1");
        assert_eq!(display_string(Some(&json!(1.5))), "1.5");
        assert_eq!(display_string(Some(&json!("EU"))), "EU");
    }

    #[test]
    fn test_identity_key_keeps_types_apart() {
        assert_ne!(identity_key(Some(&json!(1))), identity_key(Some(&json!("1"))));
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(1234567.0), "1,234,567");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(-12000.4), "-12,000");
    }
}
