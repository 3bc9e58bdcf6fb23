//! Transaction audit records.
//!
//! Every orchestrated call produces exactly one transaction row: created
//! in `PENDING` before the request leaves the process, then moved once to
//! a terminal status (`SUCCESS`, `FAILED`, or `ERROR`) when the outcome is
//! known. Rows are the durable audit trail of what was attempted and why
//! it failed.

use crate::models::request::HttpMethod;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Created before the network call; the request is in flight (or the
    /// process died mid-flight).
    Pending,
    /// The downstream service answered with a 2xx/3xx status.
    Success,
    /// The downstream service answered with a non-success status.
    Failed,
    /// The call never produced a response (transport failure, bookkeeping
    /// failure); the response snapshot carries the error message.
    Error,
}

impl TransactionStatus {
    /// Returns the stored string form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Error => "ERROR",
        }
    }

    /// Returns true for the three end states.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An audit record of one orchestrated call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier, generated fresh per call (UUID v4), never reused.
    pub id: String,

    /// Session the call belongs to.
    pub session: String,

    /// Logical action name supplied by the caller.
    pub action: String,

    /// HTTP method of the call.
    pub method: HttpMethod,

    /// Snapshot of the fully resolved outgoing request (url, headers, body).
    pub request: Value,

    /// Snapshot of the response (or error message), null while pending.
    pub response: Value,

    /// Current lifecycle status.
    pub status: TransactionStatus,

    /// Creation time (UTC).
    pub created_at: DateTime<Utc>,

    /// Time of the last status change (UTC); strictly after `created_at`
    /// once a terminal update lands.
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a new pending transaction with a fresh id and the given
    /// resolved-request snapshot.
    pub fn new(
        session: impl Into<String>,
        action: impl Into<String>,
        method: HttpMethod,
        request_snapshot: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            session: session.into(),
            action: action.into(),
            method,
            request: request_snapshot,
            response: Value::Null,
            status: TransactionStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Records the terminal outcome of the call.
    ///
    /// Stamps `updated_at` with the current time, bumped past
    /// `created_at` if the clock has not advanced since creation.
    pub fn finish(&mut self, response_snapshot: Value, status: TransactionStatus) {
        let mut now = Utc::now();
        if now <= self.created_at {
            now = self.created_at + Duration::microseconds(1);
        }
        self.response = response_snapshot;
        self.status = status;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_transaction_is_pending() {
        let txn = Transaction::new("s-1", "login", HttpMethod::POST, json!({"url": "http://x"}));
        assert_eq!(txn.status, TransactionStatus::Pending);
        assert_eq!(txn.response, Value::Null);
        assert_eq!(txn.created_at, txn.updated_at);
        assert!(Uuid::parse_str(&txn.id).is_ok());
    }

    #[test]
    fn test_fresh_ids_per_transaction() {
        let a = Transaction::new("s", "a", HttpMethod::GET, Value::Null);
        let b = Transaction::new("s", "a", HttpMethod::GET, Value::Null);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_finish_success() {
        let mut txn = Transaction::new("s-1", "login", HttpMethod::POST, Value::Null);
        txn.finish(json!({"status": 200}), TransactionStatus::Success);
        assert_eq!(txn.status, TransactionStatus::Success);
        assert_eq!(txn.response, json!({"status": 200}));
        assert!(txn.updated_at > txn.created_at);
    }

    #[test]
    fn test_finish_error_carries_message() {
        let mut txn = Transaction::new("s-1", "login", HttpMethod::POST, Value::Null);
        txn.finish(json!({"error": "connection refused"}), TransactionStatus::Error);
        assert_eq!(txn.status, TransactionStatus::Error);
        assert_eq!(txn.response["error"], "connection refused");
        assert!(txn.updated_at > txn.created_at);
    }

    #[test]
    fn test_status_terminal() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Success.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(TransactionStatus::Error.is_terminal());
    }

    #[test]
    fn test_status_serialization_is_screaming() {
        assert_eq!(serde_json::to_string(&TransactionStatus::Pending).unwrap(), "\"PENDING\"");
        assert_eq!(serde_json::to_string(&TransactionStatus::Error).unwrap(), "\"ERROR\"");
        let back: TransactionStatus = serde_json::from_str("\"SUCCESS\"").unwrap();
        assert_eq!(back, TransactionStatus::Success);
    }
}
