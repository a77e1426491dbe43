//! Built-in coercion functions.
//!
//! Every function here is idempotent: feeding back its own output returns
//! the same value. `Null` never reaches these functions; the accessor layer
//! stores it as-is.

use super::ResolvedType;
use crate::core::{Result, SchemaError, Value};
use chrono::{DateTime, NaiveDate, Utc};

fn mismatch(target: &str, value: &Value) -> SchemaError {
    SchemaError::Coercion(format!(
        "Cannot coerce {} value '{}' to {}",
        value.type_name(),
        value,
        target
    ))
}

pub fn to_string(value: Value) -> Result<Value> {
    Ok(match value {
        Value::Text(s) => Value::Text(s),
        Value::Json(serde_json::Value::String(s)) => Value::Text(s),
        other => Value::Text(other.to_string()),
    })
}

pub fn to_number(value: Value) -> Result<Value> {
    match value {
        Value::Integer(_) | Value::Float(_) => Ok(value),
        Value::Boolean(b) => Ok(Value::Integer(i64::from(b))),
        Value::Date(d) => Ok(Value::Integer(d.timestamp_millis())),
        Value::Text(ref s) => parse_number(s).ok_or_else(|| mismatch("Number", &value)),
        Value::Json(serde_json::Value::Number(n)) => {
            Ok(Value::from_json(serde_json::Value::Number(n)))
        }
        Value::Json(serde_json::Value::String(ref s)) => {
            parse_number(s).ok_or_else(|| mismatch("Number", &value))
        }
        other => Err(mismatch("Number", &other)),
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(Value::Integer(0));
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    trimmed.parse::<f64>().ok().map(Value::Float)
}

/// Truncates toward zero. Values outside the `i64` range are rejected
/// rather than saturated.
pub fn to_integer(value: Value) -> Result<Value> {
    match to_number(value)? {
        Value::Float(f) => {
            let truncated = f.trunc();
            // i64::MAX as f64 rounds up to 2^63, which is already out of range.
            if truncated.is_finite()
                && truncated >= i64::MIN as f64
                && truncated < i64::MAX as f64
            {
                Ok(Value::Integer(truncated as i64))
            } else {
                Err(SchemaError::Coercion(format!(
                    "Number {} is outside the Integer range",
                    f
                )))
            }
        }
        other => Ok(other),
    }
}

/// The literal string `"false"` is false; everything else follows truthiness.
pub fn to_boolean(value: Value) -> Result<Value> {
    Ok(match value {
        Value::Text(ref s) if s == "false" => Value::Boolean(false),
        Value::Json(serde_json::Value::String(ref s)) if s == "false" => Value::Boolean(false),
        other => Value::Boolean(other.as_bool()),
    })
}

/// Always yields a fresh `Value::Date`.
pub fn to_date(value: Value) -> Result<Value> {
    match value {
        Value::Date(d) => Ok(Value::Date(d)),
        Value::Integer(ms) => from_millis(ms).ok_or_else(|| mismatch("Date", &value)),
        Value::Float(ms) if ms.is_finite() => {
            from_millis(ms.trunc() as i64).ok_or_else(|| mismatch("Date", &value))
        }
        Value::Text(ref s) => parse_date(s).ok_or_else(|| mismatch("Date", &value)),
        Value::Json(serde_json::Value::String(ref s)) => {
            parse_date(s).ok_or_else(|| mismatch("Date", &value))
        }
        other => Err(mismatch("Date", &other)),
    }
}

fn from_millis(ms: i64) -> Option<Value> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(Value::Date)
}

fn parse_date(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(Value::Date(parsed.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Value::Date(naive.and_utc()))
}

/// Coerces every non-null element with the item type.
pub fn to_list(value: Value, item: &ResolvedType) -> Result<Value> {
    let items = match value {
        Value::List(items) => items,
        Value::Json(json @ serde_json::Value::Array(_)) => match Value::from_json(json) {
            Value::List(items) => items,
            other => return Err(mismatch("List", &other)),
        },
        other => return Err(mismatch("List", &other)),
    };

    items
        .into_iter()
        .map(|element| {
            if element.is_null() {
                Ok(element)
            } else {
                item.coerce(element)
            }
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::List)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_coercion() {
        assert_eq!(to_string(Value::Integer(42)).unwrap(), Value::Text("42".into()));
        assert_eq!(to_string(Value::Boolean(false)).unwrap(), Value::Text("false".into()));
        assert_eq!(to_string(Value::Float(1.0)).unwrap(), Value::Text("1".into()));
        assert_eq!(
            to_string(Value::Json(json!("plain"))).unwrap(),
            Value::Text("plain".into())
        );
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(to_number(Value::Text("17".into())).unwrap(), Value::Integer(17));
        assert_eq!(to_number(Value::Text(" 2.5 ".into())).unwrap(), Value::Float(2.5));
        assert_eq!(to_number(Value::Text(String::new())).unwrap(), Value::Integer(0));
        assert_eq!(to_number(Value::Boolean(true)).unwrap(), Value::Integer(1));
        assert!(matches!(
            to_number(Value::Text("abc".into())),
            Err(SchemaError::Coercion(_))
        ));
    }

    #[test]
    fn test_integer_coercion_truncates() {
        assert_eq!(to_integer(Value::Float(3.9)).unwrap(), Value::Integer(3));
        assert_eq!(to_integer(Value::Text("-7.2".into())).unwrap(), Value::Integer(-7));
        assert!(to_integer(Value::Float(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_integer_coercion_rejects_out_of_range() {
        assert!(matches!(
            to_integer(Value::Text("9999999999999999999".into())),
            Err(SchemaError::Coercion(_))
        ));
        assert!(matches!(
            to_integer(Value::Float(-1e30)),
            Err(SchemaError::Coercion(_))
        ));
        assert!(to_integer(Value::Float(9.3e18)).is_err());

        assert_eq!(
            to_integer(Value::Text("9223372036854775807".into())).unwrap(),
            Value::Integer(i64::MAX)
        );
        assert_eq!(
            to_integer(Value::Float(-9.2e18)).unwrap(),
            Value::Integer(-9_200_000_000_000_000_000)
        );
    }

    #[test]
    fn test_boolean_coercion() {
        assert_eq!(to_boolean(Value::Text("false".into())).unwrap(), Value::Boolean(false));
        assert_eq!(to_boolean(Value::Text("true".into())).unwrap(), Value::Boolean(true));
        assert_eq!(to_boolean(Value::Text("0".into())).unwrap(), Value::Boolean(true));
        assert_eq!(to_boolean(Value::Integer(0)).unwrap(), Value::Boolean(false));
        assert_eq!(to_boolean(Value::Integer(1)).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_date_coercion() {
        let from_text = to_date(Value::Text("2024-03-01T12:00:00Z".into())).unwrap();
        let millis = from_text.as_date().unwrap().timestamp_millis();
        assert_eq!(to_date(Value::Integer(millis)).unwrap(), from_text);

        let day = to_date(Value::Text("2024-03-01".into())).unwrap();
        assert_eq!(day.to_string(), "2024-03-01T00:00:00.000Z");

        assert!(to_date(Value::Text("yesterday".into())).is_err());
    }

    #[test]
    fn test_list_coercion() {
        let coerced = to_list(
            Value::List(vec![Value::Text("1".into()), Value::Null, Value::Float(2.0)]),
            &ResolvedType::Number,
        )
        .unwrap();
        assert_eq!(
            coerced,
            Value::List(vec![Value::Integer(1), Value::Null, Value::Float(2.0)])
        );

        let from_json = to_list(Value::Json(json!(["a", "b"])), &ResolvedType::String).unwrap();
        assert_eq!(
            from_json,
            Value::List(vec![Value::Text("a".into()), Value::Text("b".into())])
        );

        assert!(to_list(Value::Integer(1), &ResolvedType::String).is_err());
    }
}
