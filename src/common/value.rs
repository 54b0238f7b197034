//! Loose value semantics for Bling payloads, whose fields arrive as strings,
//! numbers or nested objects depending on the sender's format.

use serde_json::{Map, Value};

/// Empty strings, zero, `false` and `null` are falsy; objects and arrays are truthy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Looks up `key` and keeps it only when truthy.
pub fn truthy_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| truthy(v))
}

/// Walks nested objects along `path`, stopping at the first missing or falsy step.
pub fn truthy_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |node, key| {
        node.as_object().and_then(|map| truthy_field(map, key))
    })
}

/// Scalar rendered as text, `None` for objects, arrays and null.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric coercion with a zero fallback.
///
/// With `decimal_comma`, the first `,` is read as the decimal point, since
/// legacy XML payloads format prices as `19,90`.
pub fn coerce_number(value: &Value, decimal_comma: bool) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else if decimal_comma {
                s.replacen(',', ".", 1).parse::<f64>().ok()
            } else {
                s.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness() {
        for v in [json!("a"), json!(1), json!(true), json!({}), json!([]), json!("0")] {
            assert!(truthy(&v), "{v} should be truthy");
        }
        for v in [json!(""), json!(0), json!(0.0), json!(false), json!(null)] {
            assert!(!truthy(&v), "{v} should be falsy");
        }
    }

    #[test]
    fn coerces_prices() {
        assert_eq!(coerce_number(&json!("19,90"), true), 19.90);
        assert_eq!(coerce_number(&json!("19.90"), true), 19.90);
        assert_eq!(coerce_number(&json!(""), true), 0.0);
        assert_eq!(coerce_number(&json!("abc"), true), 0.0);
        assert_eq!(coerce_number(&json!(" 7 "), true), 7.0);
        assert_eq!(coerce_number(&json!(12.5), true), 12.5);
        assert_eq!(coerce_number(&json!({"valor": 1}), true), 0.0);
    }

    #[test]
    fn only_first_comma_becomes_a_point() {
        assert_eq!(coerce_number(&json!("1.234,56"), true), 0.0);
        assert_eq!(coerce_number(&json!("3,5"), false), 0.0);
    }

    #[test]
    fn rejects_non_finite_values() {
        assert_eq!(coerce_number(&json!("inf"), true), 0.0);
        assert_eq!(coerce_number(&json!("NaN"), true), 0.0);
    }

    #[test]
    fn walks_truthy_paths() {
        let v = json!({"retorno": {"produtos": {"produto": {"codigo": "A"}}, "vazio": ""}});
        assert!(truthy_path(&v, &["retorno", "produtos", "produto"]).is_some());
        assert!(truthy_path(&v, &["retorno", "vazio"]).is_none());
        assert!(truthy_path(&v, &["missing"]).is_none());
    }
}
