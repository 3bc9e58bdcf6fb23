//! Built-in jq-style filter evaluator over `serde_json::Value`.
//!
//! Supports the path subset of the jq language:
//!
//! - `.` — identity
//! - `.field.nested` — object field access (missing fields yield `null`)
//! - `.items[0]` — array indexing (out-of-bounds yields `null`)
//! - `.[]` / `.items[]` — iteration over array elements or object values,
//!   producing one result per element
//! - `a | b` — pipe the outputs of `a` through `b`
//! - `a, b` — concatenate the outputs of `a` and `b`
//!
//! Filters are compiled into a step list and then applied to a working set
//! of values, so one input can fan out into any number of ordered results.

use super::{FilterError, FilterEvaluator};
use serde_json::Value;

/// One primitive navigation step of a compiled filter.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    /// Object field access (e.g. `.name`).
    Field(String),

    /// Array index access (e.g. `[2]`).
    Index(usize),

    /// Iteration over all elements of an array or values of an object
    /// (`[]`).
    IterateAll,
}

/// A compiled filter: comma-separated branches, each a flat step list.
///
/// Pipes between path stages collapse into step concatenation, so a branch
/// needs no internal structure beyond its ordered steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFilter {
    branches: Vec<Vec<Step>>,
}

impl CompiledFilter {
    /// Applies the filter to an input value, returning every produced
    /// result in order.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Evaluation`] when a step is applied to a
    /// value it cannot navigate (field access on a number, iteration over
    /// a scalar).
    pub fn apply(&self, input: &Value) -> Result<Vec<Value>, FilterError> {
        let mut results = Vec::new();
        for branch in &self.branches {
            results.extend(apply_steps(branch, input)?);
        }
        Ok(results)
    }
}

/// The bundled [`FilterEvaluator`] implementation.
///
/// Compiles the expression on every call, matching the
/// compile-then-collect contract of the collaborator interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFilter;

impl JsonFilter {
    /// Creates a new evaluator.
    pub fn new() -> Self {
        Self
    }

    /// Compiles a filter expression for repeated application.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Compile`] when the expression is not a valid
    /// path filter.
    pub fn compile(expression: &str) -> Result<CompiledFilter, FilterError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(FilterError::Compile("empty filter expression".to_string()));
        }

        let mut branches = Vec::new();
        for branch in trimmed.split(',') {
            let mut steps = Vec::new();
            for stage in branch.split('|') {
                steps.extend(parse_path(stage.trim())?);
            }
            branches.push(steps);
        }

        Ok(CompiledFilter { branches })
    }
}

impl FilterEvaluator for JsonFilter {
    fn evaluate(&self, expression: &str, input: &Value) -> Result<Vec<Value>, FilterError> {
        JsonFilter::compile(expression)?.apply(input)
    }
}

/// Parses one path stage (e.g. `.items[0].name` or `.[]`) into steps.
fn parse_path(stage: &str) -> Result<Vec<Step>, FilterError> {
    if stage.is_empty() {
        return Err(FilterError::Compile("empty filter stage".to_string()));
    }
    if !stage.starts_with('.') {
        return Err(FilterError::Compile(format!(
            "filter stage must start with '.': {}",
            stage
        )));
    }

    let mut steps = Vec::new();
    let mut chars = stage.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '.' => {
                // Bare identity, or a dot leading into a field or bracket.
                match chars.peek() {
                    None => break,
                    Some('[') | Some('.') => continue,
                    Some(_) => {
                        let mut name = String::new();
                        while let Some(&next) = chars.peek() {
                            if next.is_ascii_alphanumeric() || next == '_' {
                                name.push(next);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                        if name.is_empty() {
                            return Err(FilterError::Compile(format!(
                                "expected field name in: {}",
                                stage
                            )));
                        }
                        steps.push(Step::Field(name));
                    }
                }
            }
            '[' => {
                let mut inner = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(next);
                }
                if !closed {
                    return Err(FilterError::Compile(format!(
                        "unclosed '[' in: {}",
                        stage
                    )));
                }
                let inner = inner.trim();
                if inner.is_empty() {
                    steps.push(Step::IterateAll);
                } else {
                    let index = inner.parse::<usize>().map_err(|_| {
                        FilterError::Compile(format!("invalid array index '{}' in: {}", inner, stage))
                    })?;
                    steps.push(Step::Index(index));
                }
            }
            other => {
                return Err(FilterError::Compile(format!(
                    "unexpected character '{}' in: {}",
                    other, stage
                )));
            }
        }
    }

    Ok(steps)
}

/// Applies a step list to the input, threading a working set of values.
fn apply_steps(steps: &[Step], input: &Value) -> Result<Vec<Value>, FilterError> {
    let mut current = vec![input.clone()];

    for step in steps {
        let mut next = Vec::new();
        for value in &current {
            match step {
                Step::Field(name) => match value {
                    Value::Object(map) => next.push(map.get(name).cloned().unwrap_or(Value::Null)),
                    Value::Null => next.push(Value::Null),
                    other => {
                        return Err(FilterError::Evaluation(format!(
                            "cannot access field '{}' of {}",
                            name,
                            type_name(other)
                        )))
                    }
                },
                Step::Index(i) => match value {
                    Value::Array(items) => next.push(items.get(*i).cloned().unwrap_or(Value::Null)),
                    Value::Null => next.push(Value::Null),
                    other => {
                        return Err(FilterError::Evaluation(format!(
                            "cannot index {} with [{}]",
                            type_name(other),
                            i
                        )))
                    }
                },
                Step::IterateAll => match value {
                    Value::Array(items) => next.extend(items.iter().cloned()),
                    Value::Object(map) => next.extend(map.values().cloned()),
                    other => {
                        return Err(FilterError::Evaluation(format!(
                            "cannot iterate over {}",
                            type_name(other)
                        )))
                    }
                },
            }
        }
        current = next;
    }

    Ok(current)
}

/// Human-readable JSON type name for error messages.
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
