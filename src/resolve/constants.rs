//! Call constants and the constant substitution pass.
//!
//! Constants are the transient, per-call counterpart of stored variables:
//! named values reflecting the request/response state of the in-flight
//! call, referenced in templates as a whole-leaf `$NAME`. A
//! [`CallConstants`] value is created empty when a call starts, populated
//! at two checkpoints (pre-send and post-receive), and discarded when the
//! call ends. It is always threaded explicitly through the pipeline — one
//! instance per `execute()` invocation, never shared between concurrent
//! calls.

use serde_json::Value;

/// The per-call constant slots.
///
/// Every slot starts unpopulated. `REQUEST_*` slots are filled once the
/// outgoing request is resolved; `RESPONSE_*` slots once the transport
/// returns; `PREVIOUS_*` slots carry the prior call's response when a
/// caller threads one instance across a sequence of calls.
#[derive(Debug, Clone, Default)]
pub struct CallConstants {
    /// Body of the previous call's response (`$PREVIOUS_RESPONSE_BODY`).
    pub previous_response_body: Option<Value>,

    /// Status code of the previous call (`$PREVIOUS_HTTP_STATUS_CODE`).
    pub previous_http_status_code: Option<Value>,

    /// Headers of the resolved outgoing request (`$REQUEST_HEADERS`).
    pub request_headers: Option<Value>,

    /// Body of the resolved outgoing request (`$REQUEST_BODY`).
    pub request_body: Option<Value>,

    /// Status code of the received response (`$RESPONSE_HTTP_STATUS_CODE`).
    pub response_http_status_code: Option<Value>,

    /// Headers of the received response (`$RESPONSE_HEADERS`).
    pub response_headers: Option<Value>,

    /// Body of the received response (`$RESPONSE_BODY`).
    pub response_body: Option<Value>,
}

impl CallConstants {
    /// Creates an empty constants value for a new call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a constant by its `$NAME` name (without the `$`).
    ///
    /// Returns `None` for unknown names and for slots that have not been
    /// populated yet; the substitution pass leaves such leaves unchanged.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match name {
            "PREVIOUS_RESPONSE_BODY" => self.previous_response_body.as_ref(),
            "PREVIOUS_HTTP_STATUS_CODE" => self.previous_http_status_code.as_ref(),
            "REQUEST_HEADERS" => self.request_headers.as_ref(),
            "REQUEST_BODY" => self.request_body.as_ref(),
            "RESPONSE_HTTP_STATUS_CODE" => self.response_http_status_code.as_ref(),
            "RESPONSE_HEADERS" => self.response_headers.as_ref(),
            "RESPONSE_BODY" => self.response_body.as_ref(),
            _ => None,
        }
    }

    /// Moves the current response body/status into the `PREVIOUS_*` slots.
    ///
    /// Called once per call, before the new request is recorded, so a
    /// threaded instance exposes the prior call's outcome while the new
    /// one is in flight.
    pub fn roll_previous(&mut self) {
        self.previous_response_body = self.response_body.take();
        self.previous_http_status_code = self.response_http_status_code.take();
    }
}

/// Constant substitution pass: replaces string leaves of the exact form
/// `$NAME` (after trimming, length > 1) with the named constant's value.
///
/// This is a whole-leaf match, not a substring scan — the entire leaf
/// becomes the constant's value, preserving its JSON type. Unknown or
/// unpopulated names leave the leaf unchanged.
pub fn substitute(tree: &Value, constants: &CallConstants) -> Value {
    match tree {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.len() > 1 && trimmed.starts_with('$') {
                if let Some(value) = constants.get(&trimmed[1..]) {
                    log::debug!("substituting constant '{}'", trimmed);
                    return value.clone();
                }
            }
            tree.clone()
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, constants)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| substitute(v, constants)).collect())
        }
        other => other.clone(),
    }
}
