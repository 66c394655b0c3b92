//! Loose JSON value coercion

use crate::error::ValidationError;
use serde_json::Value;

fn invalid(field: &'static str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidInput {
        field,
        reason: reason.into(),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Numeric field: JSON number or numeric string. `null` and blank strings are absent.
pub(crate) fn number(field: &'static str, value: &Value) -> Result<Option<f64>, ValidationError> {
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| invalid(field, format!("{} is not representable", n)))?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| invalid(field, format!("'{}' is not a number", s)))?
        }
        other => return Err(invalid(field, format!("expected a number, got {}", describe(other)))),
    };

    if !parsed.is_finite() {
        return Err(invalid(field, "must be finite"));
    }
    Ok(Some(parsed))
}

/// Count field: a number with no fractional part
pub(crate) fn count(field: &'static str, value: &Value) -> Result<Option<f64>, ValidationError> {
    match number(field, value)? {
        Some(n) if n.fract() != 0.0 => Err(invalid(field, format!("{} is not a whole number", n))),
        other => Ok(other),
    }
}

/// Flag field: boolean, number (non-zero is set) or a yes/no style string
pub(crate) fn flag(field: &'static str, value: &Value) -> Result<Option<bool>, ValidationError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        Value::Number(_) => Ok(number(field, value)?.map(|n| n != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "yes" | "on" | "1" => Ok(Some(true)),
            "false" | "no" | "off" | "0" => Ok(Some(false)),
            _ => Err(invalid(field, format!("'{}' is not a boolean", s))),
        },
        other => Err(invalid(field, format!("expected a boolean, got {}", describe(other)))),
    }
}

/// Categorical field: a string. Blank strings are absent.
pub(crate) fn label(field: &'static str, value: &Value) -> Result<Option<String>, ValidationError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(invalid(field, format!("expected a string, got {}", describe(other)))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_accepts_numbers_and_numeric_strings() {
        assert_eq!(number("x", &json!(3.5)).unwrap(), Some(3.5));
        assert_eq!(number("x", &json!(" 42 ")).unwrap(), Some(42.0));
        assert_eq!(number("x", &json!("1e6")).unwrap(), Some(1_000_000.0));
        assert_eq!(number("x", &json!(null)).unwrap(), None);
        assert_eq!(number("x", &json!("")).unwrap(), None);
    }

    #[test]
    fn test_number_rejects_malformed_values() {
        let err = number("funding_total", &json!("5M")).unwrap_err();
        assert_eq!(err.field(), Some("funding_total"));
        assert!(number("x", &json!(true)).is_err());
        assert!(number("x", &json!([1])).is_err());
        assert!(number("x", &json!("NaN")).is_err());
        assert!(number("x", &json!("inf")).is_err());
    }

    #[test]
    fn test_count_requires_whole_numbers() {
        assert_eq!(count("rounds", &json!(3)).unwrap(), Some(3.0));
        assert_eq!(count("rounds", &json!("3.0")).unwrap(), Some(3.0));
        assert!(count("rounds", &json!(2.5)).is_err());
    }

    #[test]
    fn test_flag_coercion() {
        assert_eq!(flag("f", &json!(true)).unwrap(), Some(true));
        assert_eq!(flag("f", &json!(0)).unwrap(), Some(false));
        assert_eq!(flag("f", &json!(1)).unwrap(), Some(true));
        assert_eq!(flag("f", &json!("Yes")).unwrap(), Some(true));
        assert_eq!(flag("f", &json!("off")).unwrap(), Some(false));
        assert_eq!(flag("f", &json!(null)).unwrap(), None);
        assert!(flag("f", &json!("maybe")).is_err());
        assert!(flag("f", &json!({})).is_err());
    }

    #[test]
    fn test_label_coercion() {
        assert_eq!(label("c", &json!("Web")).unwrap(), Some("Web".to_string()));
        assert_eq!(label("c", &json!("  ")).unwrap(), None);
        assert!(label("c", &json!(7)).is_err());
    }
}
