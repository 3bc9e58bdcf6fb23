//! Call orchestration.
//!
//! The [`Orchestrator`] owns the lifecycle of one templated HTTP call:
//!
//! 1. Snapshot the environment's variables.
//! 2. Resolve the url, headers, and body through the resolution pipeline
//!    (with a native-value special case for a body that is exactly one
//!    `{{placeholder}}`).
//! 3. Populate the call constants: roll the previous response into the
//!    `PREVIOUS_*` slots, record the resolved request.
//! 4. Create a `PENDING` transaction *before* the network call, so a
//!    crash mid-flight still leaves an auditable record.
//! 5. Send the request through the transport collaborator.
//! 6. Classify the outcome (2xx/3xx → `SUCCESS`, else `FAILED`) and
//!    update the transaction.
//! 7. On transport or bookkeeping failure, mark the transaction `ERROR`
//!    (best-effort) and re-raise.
//! 8. On success, run the post-script capture map: each key resolves
//!    independently and upserts back into the variable store; failures
//!    are logged per key and never change the call result.
//!
//! Every execution owns its own [`CallConstants`] value, threaded
//! explicitly through the pipeline — concurrent calls can never observe
//! each other's request or response state.

pub mod config;
pub mod transport;

pub use config::ExecutionConfig;
pub use transport::{
    HttpTransport, ReqwestTransport, TransportError, TransportRequest, TransportResponse,
};

use crate::codec;
use crate::filter::FilterEvaluator;
use crate::models::{CallRequest, CallResponse, TransactionStatus};
use crate::resolve::{self, variables::placeholder_name, CallConstants, ResolveError};
use crate::store::{StoreError, TransactionLog, VariableRow, VariableStore};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Errors surfaced to the orchestrator's caller, wrapping the failing
/// stage's root cause.
#[derive(Debug)]
pub enum OrchestrationError {
    /// Resolution of the request (or a store read before it) failed; no
    /// transaction row exists.
    Resolve(ResolveError),

    /// A store or log operation failed.
    Store(StoreError),

    /// The outbound HTTP call failed; the transaction is marked `ERROR`.
    Transport(TransportError),
}

impl std::fmt::Display for OrchestrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestrationError::Resolve(err) => write!(f, "Resolution failed: {}", err),
            OrchestrationError::Store(err) => write!(f, "Store operation failed: {}", err),
            OrchestrationError::Transport(err) => write!(f, "HTTP call failed: {}", err),
        }
    }
}

impl std::error::Error for OrchestrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OrchestrationError::Resolve(err) => Some(err),
            OrchestrationError::Store(err) => Some(err),
            OrchestrationError::Transport(err) => Some(err),
        }
    }
}

impl From<ResolveError> for OrchestrationError {
    fn from(err: ResolveError) -> Self {
        OrchestrationError::Resolve(err)
    }
}

impl From<StoreError> for OrchestrationError {
    fn from(err: StoreError) -> Self {
        OrchestrationError::Store(err)
    }
}

impl From<TransportError> for OrchestrationError {
    fn from(err: TransportError) -> Self {
        OrchestrationError::Transport(err)
    }
}

/// Outcome of one post-script capture key.
///
/// Collected into a report so the "log and continue" semantics are
/// explicit: a failed key carries its error message, a stored key the
/// value written to the variable store.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    /// The post-script key as written by the caller.
    pub key: String,

    /// The derived output variable name (`{{NAME}}` unwrapped, or the key
    /// verbatim).
    pub variable: String,

    /// The stored value, or the error message for this key.
    pub result: Result<Value, String>,
}

/// Executes templated HTTP calls against its four collaborators.
pub struct Orchestrator<V, L, F, T> {
    variables: V,
    transactions: L,
    evaluator: F,
    transport: T,
}

impl<V, L, F, T> Orchestrator<V, L, F, T>
where
    V: VariableStore,
    L: TransactionLog,
    F: FilterEvaluator,
    T: HttpTransport,
{
    /// Creates an orchestrator from its collaborators.
    pub fn new(variables: V, transactions: L, evaluator: F, transport: T) -> Self {
        Self {
            variables,
            transactions,
            evaluator,
            transport,
        }
    }

    /// Returns the variable store collaborator.
    pub fn variable_store(&self) -> &V {
        &self.variables
    }

    /// Returns the transaction log collaborator.
    pub fn transaction_log(&self) -> &L {
        &self.transactions
    }

    /// Executes one call with fresh, call-local constants.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError`] wrapping the first failing stage;
    /// see the module docs for which stages leave a transaction record.
    pub async fn execute(
        &self,
        request: &CallRequest,
    ) -> Result<CallResponse, OrchestrationError> {
        let mut constants = CallConstants::new();
        self.execute_with_constants(request, &mut constants).await
    }

    /// Executes one call with caller-threaded constants.
    ///
    /// Passing the same [`CallConstants`] across a sequence of calls makes
    /// `$PREVIOUS_RESPONSE_BODY` / `$PREVIOUS_HTTP_STATUS_CODE` reflect
    /// the prior call's outcome. During request resolution the
    /// `RESPONSE_*` slots still hold the prior call's values; they are
    /// rolled into the `PREVIOUS_*` slots before the new request is
    /// recorded.
    pub async fn execute_with_constants(
        &self,
        request: &CallRequest,
        constants: &mut CallConstants,
    ) -> Result<CallResponse, OrchestrationError> {
        log::info!(
            "executing '{}' ({} {}) in environment '{}'",
            request.action,
            request.method,
            request.url,
            request.environment
        );

        // Point-in-time snapshot; upserts during this call are not seen.
        let snapshot = self.variables.list(&request.environment)?;

        let url = self.resolve_url(request, &snapshot, constants)?;
        let headers = self.resolve_headers(request, &snapshot, constants)?;
        let body = self.resolve_body(request, &snapshot, constants)?;

        constants.roll_previous();
        constants.request_headers = Some(json!(headers.clone()));
        constants.request_body = body.clone();

        let request_snapshot = json!({
            "url": url.clone(),
            "headers": headers.clone(),
            "body": body.clone(),
        });
        let transaction = self.transactions.create(
            &request.session,
            &request.action,
            request.method,
            request_snapshot,
        )?;

        let transport_request = TransportRequest {
            method: request.method,
            url,
            headers,
            body,
        };
        let response = match self.transport.send(&transport_request).await {
            Ok(response) => response,
            Err(err) => {
                log::error!("HTTP call failed: {}", err);
                self.record_error(&transaction.id, &err.to_string());
                constants.response_headers = Some(json!({}));
                constants.response_body = Some(json!({"error": err.to_string()}));
                return Err(OrchestrationError::Transport(err));
            }
        };

        let status = if (200..400).contains(&response.status) {
            TransactionStatus::Success
        } else {
            TransactionStatus::Failed
        };
        let response_snapshot = json!({
            "status": response.status,
            "headers": response.headers.clone(),
            "body": response.body.clone(),
        });
        if let Err(err) = self
            .transactions
            .update(&transaction.id, response_snapshot, status)
        {
            log::error!("failed to record call outcome: {}", err);
            self.record_error(&transaction.id, &err.to_string());
            return Err(OrchestrationError::Store(err));
        }

        // Header values like "true" or "42" become native scalars.
        let coerced_headers: HashMap<String, Value> = response
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), codec::decode_if_json(value)))
            .collect();

        constants.response_http_status_code = Some(json!(response.status));
        constants.response_headers = Some(json!(coerced_headers.clone()));
        constants.response_body = Some(response.body.clone());

        if status == TransactionStatus::Success {
            let outcomes = self.run_post_script(request, &snapshot, constants);
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(_) => log::debug!("captured variable '{}'", outcome.variable),
                    Err(msg) => log::error!(
                        "post-script key '{}' failed: {}",
                        outcome.key,
                        msg
                    ),
                }
            }
        }

        log::info!("call '{}' completed with status {}", request.action, response.status);
        Ok(CallResponse {
            status: response.status,
            headers: coerced_headers,
            body: response.body,
        })
    }

    /// Resolves the URL, coercing a non-string result to its string form.
    fn resolve_url(
        &self,
        request: &CallRequest,
        snapshot: &[VariableRow],
        constants: &CallConstants,
    ) -> Result<String, ResolveError> {
        let resolved = resolve::resolve(
            &Value::String(request.url.clone()),
            snapshot,
            constants,
            &self.evaluator,
        )?;
        Ok(match resolved {
            Value::String(s) => s,
            other => codec::to_display_string(&other),
        })
    }

    /// Resolves the headers into a flat string map.
    ///
    /// A non-object resolution result defaults to an empty map.
    fn resolve_headers(
        &self,
        request: &CallRequest,
        snapshot: &[VariableRow],
        constants: &CallConstants,
    ) -> Result<HashMap<String, String>, ResolveError> {
        let raw = match &request.headers {
            Some(headers) => json!(headers),
            None => return Ok(HashMap::new()),
        };

        let resolved = resolve::resolve(&raw, snapshot, constants, &self.evaluator)?;
        match resolved {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(name, value)| (name, codec::to_display_string(&value)))
                .collect()),
            _ => {
                log::info!("resolved headers are not an object; sending none");
                Ok(HashMap::new())
            }
        }
    }

    /// Resolves the body.
    ///
    /// A body that is exactly one `{{NAME}}` placeholder takes the
    /// variable's stored value with its native JSON type instead of going
    /// through string interpolation. After resolution, a string body that
    /// parses as JSON is decoded; a number or boolean result is coerced
    /// back to its string form; null means no body.
    fn resolve_body(
        &self,
        request: &CallRequest,
        snapshot: &[VariableRow],
        constants: &CallConstants,
    ) -> Result<Option<Value>, ResolveError> {
        let Some(raw) = &request.body else {
            return Ok(None);
        };

        if let Value::String(text) = raw {
            if let Some(name) = placeholder_name(text) {
                // Later rows override earlier ones, same as merge order.
                if let Some(row) = snapshot.iter().rev().find(|row| row.variable == name) {
                    let native = match &row.value {
                        Value::Object(_) | Value::Array(_) => row.value.clone(),
                        other => codec::decode_value_if_json(other),
                    };
                    return Ok(coerce_body(native));
                }
            }
        }

        let resolved = resolve::resolve(raw, snapshot, constants, &self.evaluator)?;
        let parsed = match &resolved {
            Value::String(text) => codec::decode_if_json(text),
            other => other.clone(),
        };
        Ok(coerce_body(parsed))
    }

    /// Runs the post-script capture map, one key at a time.
    ///
    /// Each key resolves against the same variable snapshot and the now
    /// fully populated constants; its output variable name comes from
    /// `{{NAME}}` in the key (or the key verbatim). One key's failure is
    /// recorded in its outcome and does not affect the other keys.
    fn run_post_script(
        &self,
        request: &CallRequest,
        snapshot: &[VariableRow],
        constants: &CallConstants,
    ) -> Vec<CaptureOutcome> {
        let Some(script) = &request.post_script else {
            return Vec::new();
        };

        let mut outcomes = Vec::with_capacity(script.len());
        for (key, expression) in script {
            let variable = placeholder_name(key).unwrap_or_else(|| key.clone());
            let result = resolve::resolve(
                &Value::String(expression.clone()),
                snapshot,
                constants,
                &self.evaluator,
            )
            .map_err(|err| err.to_string())
            .and_then(|value| {
                self.variables
                    .upsert(&request.environment, &variable, value.clone())
                    .map(|_| value)
                    .map_err(|err| err.to_string())
            });

            outcomes.push(CaptureOutcome {
                key: key.clone(),
                variable,
                result,
            });
        }
        outcomes
    }

    /// Best-effort `ERROR` bookkeeping: a failure to write the update is
    /// logged, never escalated.
    fn record_error(&self, transaction_id: &str, message: &str) {
        if let Err(err) = self.transactions.update(
            transaction_id,
            json!({"error": message}),
            TransactionStatus::Error,
        ) {
            log::error!("failed to mark transaction {} as ERROR: {}", transaction_id, err);
        }
    }
}

/// Applies the outgoing-body coercion rule: containers and strings pass
/// through, null means no body, and other scalars are sent in string form.
fn coerce_body(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(_) | Value::Array(_) | Value::String(_) => Some(value),
        other => Some(Value::String(codec::to_display_string(&other))),
    }
}
