//! Variable substitution pass.
//!
//! Replaces every `{{ variableName }}` occurrence inside string leaves
//! with the string form of the stored variable's value. Substitution is a
//! single pass: spliced values are not re-scanned for further
//! placeholders.

use super::{map_string_leaves, ResolveError};
use crate::codec;
use crate::store::VariableRow;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// Cached pattern for `{{ name }}` placeholders (whitespace inside the
/// braces is ignored).
static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("Failed to compile placeholder regex"));

/// Cached pattern matching a string that is exactly one placeholder.
static PLACEHOLDER_ONLY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\{\{\s*(.*?)\s*\}\}$").expect("Failed to compile whole-placeholder regex")
});

/// Substitutes placeholders through every string leaf of `tree`.
///
/// Later rows override earlier rows with the same variable name. A `null`
/// value renders as the empty string; objects and arrays render as compact
/// JSON. An unknown placeholder name fails the whole resolution with
/// [`ResolveError::MissingVariable`].
pub fn substitute(tree: &Value, variables: &[VariableRow]) -> Result<Value, ResolveError> {
    let merged = merge(variables);
    map_string_leaves(tree, &|text| substitute_text(text, &merged).map(Value::String))
}

/// Merges variable rows into a name → value map, later rows winning.
pub(crate) fn merge(variables: &[VariableRow]) -> HashMap<String, Value> {
    let mut merged = HashMap::with_capacity(variables.len());
    for row in variables {
        merged.insert(row.variable.clone(), row.value.clone());
    }
    merged
}

/// If `text` is exactly one `{{NAME}}` placeholder (after trimming),
/// returns the trimmed name.
///
/// Used by the orchestrator for the native-body special case and for
/// deriving post-script output variable names.
pub fn placeholder_name(text: &str) -> Option<String> {
    PLACEHOLDER_ONLY_REGEX
        .captures(text.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Replaces each placeholder occurrence in one string.
fn substitute_text(text: &str, merged: &HashMap<String, Value>) -> Result<String, ResolveError> {
    // Fast path: no placeholder markers at all.
    if !text.contains("{{") {
        return Ok(text.to_string());
    }

    let re = &*PLACEHOLDER_REGEX;
    let mut result = String::with_capacity(text.len());
    let mut last_match_end = 0;

    for cap in re.captures_iter(text) {
        let full_match = cap.get(0).expect("match group 0 always present");
        let name = cap.get(1).expect("capture group 1 always present").as_str().trim();

        result.push_str(&text[last_match_end..full_match.start()]);

        match merged.get(name) {
            Some(value) => {
                let rendered = codec::to_display_string(value);
                log::debug!("substituting variable '{}'", name);
                result.push_str(&rendered);
            }
            None => {
                log::error!("variable '{}' not provided", name);
                return Err(ResolveError::MissingVariable(name.to_string()));
            }
        }

        last_match_end = full_match.end();
    }

    result.push_str(&text[last_match_end..]);
    Ok(result)
}
