//! Loose JSON decoding helpers.
//!
//! Values that pass through placeholder substitution or arrive as HTTP
//! header text frequently look like JSON without being typed as such:
//! `"true"`, `"42"`, `"{\"a\":1}"`. This module decodes such strings back
//! into native `serde_json` values and renders values to the string form
//! used when a template slot demands text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Matches JSON number literals (integers, decimals, exponents).
static NUMBER_LITERAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d+(\.\d+)?([eE][+-]?\d+)?$").expect("Failed to compile number literal regex")
});

/// Decodes a string into a native JSON value when it looks like one.
///
/// Strings starting with `{` or `[` are parsed as JSON documents; the
/// scalar literals `true`, `false`, `null`, and numbers are parsed into
/// their native types. Anything else (including text that merely resembles
/// JSON but fails to parse) is returned as a string, unchanged.
///
/// # Examples
///
/// ```
/// use rest_orchestrator::codec::decode_if_json;
/// use serde_json::json;
///
/// assert_eq!(decode_if_json("true"), json!(true));
/// assert_eq!(decode_if_json("42"), json!(42));
/// assert_eq!(decode_if_json(r#"{"a":1}"#), json!({"a":1}));
/// assert_eq!(decode_if_json("plain text"), json!("plain text"));
/// ```
pub fn decode_if_json(text: &str) -> Value {
    let trimmed = text.trim();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(parsed) => return normalize(parsed),
            Err(_) => return Value::String(text.to_string()),
        }
    }

    coerce_scalar(trimmed).unwrap_or_else(|| Value::String(text.to_string()))
}

/// Applies [`decode_if_json`] through an existing JSON value.
///
/// String leaves that look like scalar literals are coerced to their
/// native type; containers are normalized recursively; everything else is
/// returned unchanged.
pub fn decode_value_if_json(value: &Value) -> Value {
    match value {
        Value::String(s) => decode_if_json(s),
        Value::Object(_) | Value::Array(_) => normalize(value.clone()),
        other => other.clone(),
    }
}

/// Renders a JSON value to the text form used when a template slot is
/// string-typed.
///
/// Strings are returned without quotes, numbers and booleans in their
/// literal form, null as the empty string, and containers as compact JSON.
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string(value).unwrap_or_else(|_| String::new())
        }
    }
}

/// Parses a scalar literal (`true`/`false`/`null`/number) if the text is
/// exactly one. Returns `None` for anything else.
fn coerce_scalar(text: &str) -> Option<Value> {
    if text == "true" || text == "false" || text == "null" || NUMBER_LITERAL_REGEX.is_match(text) {
        serde_json::from_str(text).ok()
    } else {
        None
    }
}

/// Recursively coerces scalar-looking string leaves inside containers.
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, normalize(v))).collect()),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::String(s) => coerce_scalar(s.trim()).unwrap_or(Value::String(s)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode_if_json("true"), json!(true));
        assert_eq!(decode_if_json("false"), json!(false));
        assert_eq!(decode_if_json("null"), json!(null));
        assert_eq!(decode_if_json("123"), json!(123));
        assert_eq!(decode_if_json("-4.5"), json!(-4.5));
        assert_eq!(decode_if_json("1e3"), json!(1000.0));
    }

    #[test]
    fn test_decode_containers() {
        assert_eq!(decode_if_json(r#"{"a": 1, "b": [2, 3]}"#), json!({"a": 1, "b": [2, 3]}));
        assert_eq!(decode_if_json("[1, 2, 3]"), json!([1, 2, 3]));
    }

    #[test]
    fn test_decode_nested_scalar_strings() {
        // Scalar-looking strings inside a parsed container are coerced too.
        assert_eq!(
            decode_if_json(r#"{"count": "42", "active": "true"}"#),
            json!({"count": 42, "active": true})
        );
    }

    #[test]
    fn test_decode_plain_text_unchanged() {
        assert_eq!(decode_if_json("hello world"), json!("hello world"));
        assert_eq!(decode_if_json("42abc"), json!("42abc"));
        // Leading-zero "numbers" are not valid JSON and stay strings.
        assert_eq!(decode_if_json("0123"), json!("0123"));
    }

    #[test]
    fn test_decode_invalid_json_document_unchanged() {
        assert_eq!(decode_if_json("{not json"), json!("{not json"));
        assert_eq!(decode_if_json("[1, 2,"), json!("[1, 2,"));
    }

    #[test]
    fn test_decode_value_if_json() {
        assert_eq!(decode_value_if_json(&json!("true")), json!(true));
        assert_eq!(decode_value_if_json(&json!({"n": "7"})), json!({"n": 7}));
        assert_eq!(decode_value_if_json(&json!(9)), json!(9));
    }

    #[test]
    fn test_to_display_string() {
        assert_eq!(to_display_string(&json!("text")), "text");
        assert_eq!(to_display_string(&json!(42)), "42");
        assert_eq!(to_display_string(&json!(true)), "true");
        assert_eq!(to_display_string(&json!(null)), "");
        assert_eq!(to_display_string(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(to_display_string(&json!([1, 2])), "[1,2]");
    }
}
