//! Expression resolution pipeline.
//!
//! This module rewrites arbitrary JSON trees through four ordered passes,
//! each a single full traversal applied exactly once:
//!
//! 1. **Variable substitution** — `{{variableName}}` placeholders inside
//!    string leaves are spliced with stored variable values
//!    ([`variables`]).
//! 2. **Constant substitution** — a string leaf that is exactly `$NAME`
//!    is replaced wholesale by the named call constant ([`constants`]).
//! 3. **Base64 transform** — whole-leaf `base64_encode(...)` /
//!    `base64_decode(...)` grammars ([`encoding`]).
//! 4. **Filter-expression transform** — whole-leaf
//!    `filter_expression('<expr>', <data>)` leaves evaluated through the
//!    filter collaborator ([`filter`]).
//!
//! Later passes consume the literal text earlier passes produced (a
//! variable can expand to a `$RESPONSE_BODY` reference), but no pass
//! re-scans its own output, so resolution always terminates and a
//! variable's value is never itself re-interpolated.

pub mod constants;
pub mod encoding;
pub mod filter;
pub mod variables;

pub use constants::CallConstants;

use crate::filter::{FilterError, FilterEvaluator};
use crate::store::VariableRow;
use serde_json::Value;

/// Errors that can occur while resolving a tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// A `{{placeholder}}` referenced a variable that is not defined.
    MissingVariable(String),

    /// A `base64_decode` leaf carried malformed base64 (or bytes that are
    /// not valid UTF-8).
    InvalidEncoding(String),

    /// The filter collaborator failed to compile or evaluate an
    /// expression.
    Filter(FilterError),
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::MissingVariable(name) => {
                write!(f, "Variable '{}' not provided", name)
            }
            ResolveError::InvalidEncoding(msg) => write!(f, "Invalid encoding: {}", msg),
            ResolveError::Filter(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Filter(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FilterError> for ResolveError {
    fn from(err: FilterError) -> Self {
        ResolveError::Filter(err)
    }
}

/// Resolves a JSON tree against a variable snapshot and the live call
/// constants.
///
/// Runs the four passes in fixed order, each once. Non-string leaves pass
/// through every stage unchanged. Failure at any stage aborts the whole
/// resolution; there is no partial output.
///
/// # Arguments
///
/// * `tree` - The JSON tree to rewrite (object/array/string/number/bool/null)
/// * `variables` - Variable rows; later rows override earlier rows with
///   the same name
/// * `constants` - The call-local constants referenced via `$NAME`
/// * `evaluator` - The filter collaborator for `filter_expression` leaves
///
/// # Examples
///
/// ```
/// use rest_orchestrator::filter::JsonFilter;
/// use rest_orchestrator::resolve::{resolve, CallConstants};
/// use rest_orchestrator::store::VariableRow;
/// use serde_json::json;
///
/// let variables = vec![VariableRow::new("dev", "host", json!("api.example.com"))];
/// let resolved = resolve(
///     &json!("https://{{host}}/users"),
///     &variables,
///     &CallConstants::new(),
///     &JsonFilter::new(),
/// )
/// .unwrap();
/// assert_eq!(resolved, json!("https://api.example.com/users"));
/// ```
pub fn resolve(
    tree: &Value,
    variables: &[VariableRow],
    constants: &CallConstants,
    evaluator: &dyn FilterEvaluator,
) -> Result<Value, ResolveError> {
    log::debug!("resolve start");
    let pass = variables::substitute(tree, variables)?;
    let pass = constants::substitute(&pass, constants);
    let pass = encoding::transform(&pass)?;
    let resolved = filter::transform(&pass, constants, evaluator)?;
    log::debug!("resolve done");
    Ok(resolved)
}

/// Rebuilds a tree by applying `transform` to every string leaf.
///
/// Objects and arrays are traversed recursively; numbers, booleans, and
/// null are cloned unchanged. The transform may return any JSON value, so
/// a pass can replace a string leaf with a non-string result.
pub(crate) fn map_string_leaves<F>(value: &Value, transform: &F) -> Result<Value, ResolveError>
where
    F: Fn(&str) -> Result<Value, ResolveError>,
{
    match value {
        Value::String(s) => transform(s),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                out.insert(key.clone(), map_string_leaves(item, transform)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(map_string_leaves(item, transform)?);
            }
            Ok(Value::Array(out))
        }
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::JsonFilter;
    use serde_json::json;

    fn rows(pairs: &[(&str, Value)]) -> Vec<VariableRow> {
        pairs
            .iter()
            .map(|(name, value)| VariableRow::new("test", *name, value.clone()))
            .collect()
    }

    fn run(tree: Value, variables: &[VariableRow], constants: &CallConstants) -> Value {
        resolve(&tree, variables, constants, &JsonFilter::new()).unwrap()
    }

    #[test]
    fn test_variable_then_string_form() {
        let variables = rows(&[("X", json!("5"))]);
        assert_eq!(run(json!("{{X}}"), &variables, &CallConstants::new()), json!("5"));
    }

    #[test]
    fn test_constant_whole_leaf_keeps_type() {
        let mut constants = CallConstants::new();
        constants.response_body = Some(json!(7));
        assert_eq!(run(json!("$RESPONSE_BODY"), &[], &constants), json!(7));
    }

    #[test]
    fn test_full_tree_mixed_passes() {
        let variables = rows(&[("user", json!("alice")), ("secret", json!("hello"))]);
        let mut constants = CallConstants::new();
        constants.response_http_status_code = Some(json!(200));

        let tree = json!({
            "name": "{{user}}",
            "token": "base64_encode({{secret}})",
            "status": "$RESPONSE_HTTP_STATUS_CODE",
            "count": 3,
            "nested": ["{{user}}", true, null]
        });

        let resolved = run(tree, &variables, &constants);
        assert_eq!(
            resolved,
            json!({
                "name": "alice",
                "token": "aGVsbG8=",
                "status": 200,
                "count": 3,
                "nested": ["alice", true, null]
            })
        );
    }

    #[test]
    fn test_filter_single_result_collapses() {
        let resolved = run(
            json!(r#"filter_expression('.a', {"a":1})"#),
            &[],
            &CallConstants::new(),
        );
        assert_eq!(resolved, json!(1));
    }

    #[test]
    fn test_filter_multi_result_stays_list() {
        let resolved = run(
            json!("filter_expression('.[]', [1,2])"),
            &[],
            &CallConstants::new(),
        );
        assert_eq!(resolved, json!([1, 2]));
    }

    #[test]
    fn test_filter_reads_constant_data() {
        let mut constants = CallConstants::new();
        constants.response_body = Some(json!({"token": "abc"}));
        let resolved = run(
            json!("filter_expression('.token', $RESPONSE_BODY)"),
            &[],
            &constants,
        );
        assert_eq!(resolved, json!("abc"));
    }

    #[test]
    fn test_variable_value_is_not_reinterpolated() {
        // A value containing placeholder syntax is spliced literally; the
        // pass does not re-scan its own output.
        let variables = rows(&[("a", json!("{{b}}")), ("b", json!("ignored"))]);
        assert_eq!(
            run(json!("value: {{a}}"), &variables, &CallConstants::new()),
            json!("value: {{b}}")
        );
    }

    #[test]
    fn test_variable_can_produce_constant_reference() {
        // Later passes consume text produced by earlier passes.
        let variables = rows(&[("ref", json!("$RESPONSE_BODY"))]);
        let mut constants = CallConstants::new();
        constants.response_body = Some(json!([1, 2, 3]));
        assert_eq!(run(json!("{{ref}}"), &variables, &constants), json!([1, 2, 3]));
    }

    #[test]
    fn test_missing_variable_aborts_whole_resolution() {
        let variables = rows(&[("known", json!("v"))]);
        let result = resolve(
            &json!({"ok": "{{known}}", "bad": "{{unknown}}"}),
            &variables,
            &CallConstants::new(),
            &JsonFilter::new(),
        );
        assert_eq!(
            result,
            Err(ResolveError::MissingVariable("unknown".to_string()))
        );
    }

    #[test]
    fn test_resolution_is_idempotent_for_plain_values() {
        let variables = rows(&[("host", json!("example.com")), ("port", json!(8080))]);
        let constants = CallConstants::new();
        let once = run(json!("{{host}}:{{port}}"), &variables, &constants);
        let twice = run(once.clone(), &variables, &constants);
        assert_eq!(once, twice);
        assert_eq!(once, json!("example.com:8080"));
    }

    #[test]
    fn test_error_display() {
        let err = ResolveError::MissingVariable("token".to_string());
        assert_eq!(format!("{}", err), "Variable 'token' not provided");

        let err = ResolveError::InvalidEncoding("bad padding".to_string());
        assert_eq!(format!("{}", err), "Invalid encoding: bad padding");
    }
}
