//! Filter-expression transform pass.
//!
//! Rewrites string leaves of the whole-leaf form
//! `filter_expression('<expr>', <data>)`. The data argument may be a JSON
//! literal, a quoted string, or a `$NAME` call-constant reference; it is
//! resolved first, then the filter collaborator evaluates `<expr>` against
//! it. A single result becomes the new leaf value directly (any JSON
//! type); multiple results become the full ordered list.

use super::{constants::CallConstants, map_string_leaves, ResolveError};
use crate::filter::FilterEvaluator;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Anchored pattern for `filter_expression('<expr>', <data>)`, accepting
/// single- or double-quoted expressions.
static FILTER_EXPRESSION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^filter_expression\(\s*(?:'([^']*)'|"([^"]*)")\s*,\s*(.*?)\s*\)$"#)
        .expect("Failed to compile filter expression regex")
});

/// Applies the filter transform across every string leaf of `tree`.
pub fn transform(
    tree: &Value,
    constants: &CallConstants,
    evaluator: &dyn FilterEvaluator,
) -> Result<Value, ResolveError> {
    map_string_leaves(tree, &|text| transform_leaf(text, constants, evaluator))
}

/// Transforms one leaf if it matches the filter grammar.
fn transform_leaf(
    text: &str,
    constants: &CallConstants,
    evaluator: &dyn FilterEvaluator,
) -> Result<Value, ResolveError> {
    let trimmed = text.trim();

    let Some(caps) = FILTER_EXPRESSION_REGEX.captures(trimmed) else {
        return Ok(Value::String(text.to_string()));
    };

    let expression = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str())
        .unwrap_or("");
    let data_src = caps.get(3).map(|m| m.as_str()).unwrap_or("").trim();

    let data = resolve_data(data_src, constants);
    log::debug!("evaluating filter '{}'", expression);

    let mut results = evaluator.evaluate(expression, &data)?;
    if results.len() == 1 {
        Ok(results.remove(0))
    } else {
        Ok(Value::Array(results))
    }
}

/// Resolves the data argument: constant reference, then quoted-string or
/// JSON-literal unwrapping.
fn resolve_data(data_src: &str, constants: &CallConstants) -> Value {
    let mut data = if data_src.len() > 1 && data_src.starts_with('$') {
        constants
            .get(&data_src[1..])
            .cloned()
            .unwrap_or_else(|| Value::String(data_src.to_string()))
    } else {
        Value::String(data_src.to_string())
    };

    if let Value::String(s) = &data {
        if let Some(first) = s.chars().next() {
            if (first == '"' || first == '\'') && s.len() >= 2 && s.ends_with(first) {
                data = Value::String(s[1..s.len() - 1].to_string());
            } else if first == '{' || first == '[' {
                if let Ok(parsed) = serde_json::from_str::<Value>(s) {
                    data = parsed;
                }
            }
        }
    }

    data
}
