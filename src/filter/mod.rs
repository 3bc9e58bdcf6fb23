//! Filter-expression evaluation.
//!
//! The resolution pipeline delegates `filter_expression('<expr>', <data>)`
//! leaves to a [`FilterEvaluator`]: a collaborator that compiles a
//! jq-style filter string, applies it to a JSON value, and returns the
//! ordered list of results it produced. The bundled [`JsonFilter`]
//! implements the path subset of that language over `serde_json::Value`;
//! callers with richer needs can plug in their own evaluator.

pub mod json_filter;

pub use json_filter::{CompiledFilter, JsonFilter};

use serde_json::Value;

/// Errors produced by filter compilation or evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    /// The filter expression could not be parsed.
    Compile(String),

    /// The filter failed while being applied to the input value.
    Evaluation(String),
}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterError::Compile(msg) => write!(f, "Filter compile error: {}", msg),
            FilterError::Evaluation(msg) => write!(f, "Filter evaluation error: {}", msg),
        }
    }
}

impl std::error::Error for FilterError {}

/// Evaluates filter expressions against JSON values.
///
/// Implementations compile `expression`, apply it to `input`, and return
/// every produced value in order. An empty result list is valid output,
/// not an error.
pub trait FilterEvaluator: Send + Sync {
    /// Applies `expression` to `input` and returns all results in order.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Compile`] for an unparseable expression and
    /// [`FilterError::Evaluation`] for a runtime failure (e.g. iterating a
    /// scalar).
    fn evaluate(&self, expression: &str, input: &Value) -> Result<Vec<Value>, FilterError>;
}
