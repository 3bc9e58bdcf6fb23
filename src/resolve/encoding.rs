//! Base64 transform pass.
//!
//! Rewrites string leaves matching the fixed encode/decode grammars:
//!
//! - `{{base64_encode(X)}}` / `{{base64_encode.X}}` / `base64_encode(X)`
//! - `{{base64_decode(X)}}` / `{{base64_decode.X}}` / `base64_decode(X)`
//!
//! Only whole-leaf matches trigger a transform; everything else passes
//! through unchanged. The argument is trimmed before encoding/decoding.

use super::{map_string_leaves, ResolveError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

/// Anchored pattern for the three encode grammars.
static BASE64_ENCODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:\{\{\s*base64_encode\.(.*?)\s*\}\}|\{\{\s*base64_encode\(\s*(.*?)\s*\)\s*\}\}|base64_encode\(\s*(.*?)\s*\))$",
    )
    .expect("Failed to compile base64 encode regex")
});

/// Anchored pattern for the three decode grammars.
static BASE64_DECODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:\{\{\s*base64_decode\.(.*?)\s*\}\}|\{\{\s*base64_decode\(\s*(.*?)\s*\)\s*\}\}|base64_decode\(\s*(.*?)\s*\))$",
    )
    .expect("Failed to compile base64 decode regex")
});

/// Applies the base64 transform across every string leaf of `tree`.
pub fn transform(tree: &Value) -> Result<Value, ResolveError> {
    map_string_leaves(tree, &transform_leaf)
}

/// Encodes a string as standard base64.
pub fn encode_base64(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decodes standard base64 back into a UTF-8 string.
///
/// # Errors
///
/// Returns [`ResolveError::InvalidEncoding`] when the input is not valid
/// base64 or the decoded bytes are not valid UTF-8.
pub fn decode_base64(encoded: &str) -> Result<String, ResolveError> {
    let bytes = STANDARD.decode(encoded).map_err(|e| {
        log::error!("invalid base64 input: {}", e);
        ResolveError::InvalidEncoding(format!("invalid base64 input: {}", e))
    })?;
    String::from_utf8(bytes).map_err(|e| {
        log::error!("decoded bytes are not valid UTF-8: {}", e);
        ResolveError::InvalidEncoding(format!("decoded bytes are not valid UTF-8: {}", e))
    })
}

/// Transforms one leaf if it matches an encode/decode grammar.
fn transform_leaf(text: &str) -> Result<Value, ResolveError> {
    let trimmed = text.trim();

    if let Some(caps) = BASE64_ENCODE_REGEX.captures(trimmed) {
        let content = first_group(&caps).trim();
        return Ok(Value::String(encode_base64(content)));
    }

    if let Some(caps) = BASE64_DECODE_REGEX.captures(trimmed) {
        let encoded = first_group(&caps).trim();
        return Ok(Value::String(decode_base64(encoded)?));
    }

    Ok(Value::String(text.to_string()))
}

/// Returns whichever alternation branch captured the argument.
fn first_group<'t>(caps: &Captures<'t>) -> &'t str {
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .map(|m| m.as_str())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_paren_form() {
        assert_eq!(transform(&json!("base64_encode(hello)")).unwrap(), json!("aGVsbG8="));
    }

    #[test]
    fn test_encode_braced_forms() {
        assert_eq!(
            transform(&json!("{{base64_encode(hello)}}")).unwrap(),
            json!("aGVsbG8=")
        );
        assert_eq!(
            transform(&json!("{{base64_encode.hello}}")).unwrap(),
            json!("aGVsbG8=")
        );
    }

    #[test]
    fn test_decode_forms() {
        assert_eq!(transform(&json!("base64_decode(aGVsbG8=)")).unwrap(), json!("hello"));
        assert_eq!(
            transform(&json!("{{base64_decode(aGVsbG8=)}}")).unwrap(),
            json!("hello")
        );
        assert_eq!(
            transform(&json!("{{base64_decode.aGVsbG8=}}")).unwrap(),
            json!("hello")
        );
    }

    #[test]
    fn test_argument_whitespace_trimmed() {
        assert_eq!(
            transform(&json!("base64_encode(  hello  )")).unwrap(),
            json!("aGVsbG8=")
        );
    }

    #[test]
    fn test_unicode_roundtrip() {
        assert_eq!(transform(&json!("base64_encode(café)")).unwrap(), json!("Y2Fmw6k="));
        assert_eq!(transform(&json!("base64_decode(Y2Fmw6k=)")).unwrap(), json!("café"));
    }

    #[test]
    fn test_invalid_base64_fails() {
        let result = transform(&json!("base64_decode(not-base64!!)"));
        assert!(matches!(result, Err(ResolveError::InvalidEncoding(_))));
    }

    #[test]
    fn test_partial_leaf_is_not_transformed() {
        // Only whole-leaf matches trigger; embedded grammars pass through.
        let text = json!("prefix base64_encode(hello) suffix");
        assert_eq!(transform(&text).unwrap(), text);
    }

    #[test]
    fn test_non_matching_leaves_unchanged() {
        assert_eq!(transform(&json!("plain")).unwrap(), json!("plain"));
        assert_eq!(
            transform(&json!({"n": 1, "s": "keep"})).unwrap(),
            json!({"n": 1, "s": "keep"})
        );
    }

    #[test]
    fn test_traverses_nested_tree() {
        let tree = json!({"auth": ["base64_encode(user:pass)"]});
        assert_eq!(
            transform(&tree).unwrap(),
            json!({"auth": ["dXNlcjpwYXNz"]})
        );
    }
}
