//! Persistence collaborators: the variable store and the transaction log.
//!
//! Both are shared, externally owned resources the orchestrator touches
//! only through the narrow operations defined here. Two implementations
//! ship with the crate: an in-memory store with per-environment atomic
//! upsert ([`memory`]) and a JSONL file-backed store ([`file`]).

pub mod file;
pub mod memory;

pub use file::{FileTransactionLog, FileVariableStore};
pub use memory::{InMemoryTransactionLog, InMemoryVariableStore};

use crate::models::{HttpMethod, Transaction, TransactionStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One stored variable: at most one row exists per
/// `(environment, variable)` pair at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRow {
    /// Namespace partitioning variable names (e.g. "dev", "prod").
    pub environment: String,

    /// Variable name referenced as `{{variable}}` in templates.
    pub variable: String,

    /// The stored JSON value.
    pub value: Value,
}

impl VariableRow {
    /// Creates a new variable row.
    pub fn new(
        environment: impl Into<String>,
        variable: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            environment: environment.into(),
            variable: variable.into(),
            value,
        }
    }
}

/// Errors that can occur during store or log operations.
#[derive(Debug)]
pub enum StoreError {
    /// File I/O failed.
    Io(std::io::Error),

    /// A row could not be serialized or deserialized.
    Serialization(serde_json::Error),

    /// An update targeted a transaction id that does not exist.
    TransactionNotFound(String),

    /// A store operation exceeded its deadline. The built-in local stores
    /// never produce this; remote implementations surface deadline expiry
    /// through it.
    Timeout,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "Store I/O error: {}", err),
            StoreError::Serialization(err) => write!(f, "Store serialization error: {}", err),
            StoreError::TransactionNotFound(id) => write!(f, "Transaction {} not found", id),
            StoreError::Timeout => write!(f, "Store operation timed out"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err)
    }
}

/// Keyed storage for environment variables.
///
/// Upsert must be atomic per `(environment, variable)` key: concurrent
/// writers to the same key must not silently drop an update.
pub trait VariableStore: Send + Sync {
    /// Returns all rows for an environment.
    fn list(&self, environment: &str) -> Result<Vec<VariableRow>, StoreError>;

    /// Returns the row for a specific variable, if present.
    fn find(&self, environment: &str, variable: &str) -> Result<Option<VariableRow>, StoreError>;

    /// Creates or updates the row for `(environment, variable)` and
    /// returns the stored row.
    fn upsert(
        &self,
        environment: &str,
        variable: &str,
        value: Value,
    ) -> Result<VariableRow, StoreError>;

    /// Deletes every row of an environment, returning the removed count.
    fn delete_all(&self, environment: &str) -> Result<usize, StoreError>;
}

/// Append-by-id storage for transaction audit records.
///
/// A call updates its own transaction exactly twice: create, then one
/// terminal update. Updates to the same id are serialized by the
/// implementation.
pub trait TransactionLog: Send + Sync {
    /// Creates a new `PENDING` transaction snapshotting the resolved
    /// request.
    fn create(
        &self,
        session: &str,
        action: &str,
        method: HttpMethod,
        request_snapshot: Value,
    ) -> Result<Transaction, StoreError>;

    /// Moves a transaction to a terminal status with its response
    /// snapshot and returns the updated record.
    fn update(
        &self,
        id: &str,
        response_snapshot: Value,
        status: TransactionStatus,
    ) -> Result<Transaction, StoreError>;

    /// Returns a transaction by id, if present.
    fn get(&self, id: &str) -> Result<Option<Transaction>, StoreError>;

    /// Returns all transactions, oldest first.
    fn list_all(&self) -> Result<Vec<Transaction>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variable_row_serialization() {
        let row = VariableRow::new("dev", "token", json!({"k": 1}));
        let text = serde_json::to_string(&row).unwrap();
        let back: VariableRow = serde_json::from_str(&text).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::TransactionNotFound("t-1".to_string());
        assert_eq!(format!("{}", err), "Transaction t-1 not found");

        let err = StoreError::Timeout;
        assert_eq!(format!("{}", err), "Store operation timed out");

        let io = StoreError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(format!("{}", io).contains("gone"));
    }

    #[test]
    fn test_store_error_source() {
        use std::error::Error;
        let io = StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "x"));
        assert!(io.source().is_some());
        assert!(StoreError::Timeout.source().is_none());
    }
}
