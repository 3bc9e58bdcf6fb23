//! Call response data model.
//!
//! The orchestrator returns the downstream response in a normalized shape:
//! numeric status, a header map whose stringly-typed values have been
//! coerced to native JSON scalars, and a body decoded as JSON when the
//! server sent JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The outcome of one orchestrated HTTP call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResponse {
    /// HTTP status code returned by the downstream service.
    pub status: u16,

    /// Response headers. Values like `"true"` or `"42"` are normalized to
    /// native JSON scalars.
    pub headers: HashMap<String, Value>,

    /// Response body: parsed JSON when the payload was JSON, otherwise the
    /// raw text as a string.
    pub body: Value,
}

impl CallResponse {
    /// Returns true if the status code is in the 2xx/3xx range, the range
    /// the orchestrator classifies as `SUCCESS`.
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}
