//! In-memory store implementations.
//!
//! Backed by concurrent maps so that calls running in parallel can read
//! and write without a global lock: variable upserts lock only the touched
//! environment's entry, transaction updates lock only the touched id.

use super::{StoreError, TransactionLog, VariableRow, VariableStore};
use crate::models::{HttpMethod, Transaction, TransactionStatus};
use dashmap::DashMap;
use serde_json::Value;

/// Variable store keeping rows in memory, grouped by environment.
///
/// Rows within an environment keep insertion order, so `list` output is
/// stable and later-defined variables override earlier ones during
/// resolution merging.
#[derive(Debug, Default)]
pub struct InMemoryVariableStore {
    environments: DashMap<String, Vec<VariableRow>>,
}

impl InMemoryVariableStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl VariableStore for InMemoryVariableStore {
    fn list(&self, environment: &str) -> Result<Vec<VariableRow>, StoreError> {
        Ok(self
            .environments
            .get(environment)
            .map(|rows| rows.clone())
            .unwrap_or_default())
    }

    fn find(&self, environment: &str, variable: &str) -> Result<Option<VariableRow>, StoreError> {
        Ok(self.environments.get(environment).and_then(|rows| {
            rows.iter().find(|row| row.variable == variable).cloned()
        }))
    }

    fn upsert(
        &self,
        environment: &str,
        variable: &str,
        value: Value,
    ) -> Result<VariableRow, StoreError> {
        let row = VariableRow::new(environment, variable, value);
        // The entry guard holds the shard lock for this environment, so
        // the read-modify-write below is atomic per key.
        let mut rows = self.environments.entry(environment.to_string()).or_default();
        match rows.iter_mut().find(|existing| existing.variable == variable) {
            Some(existing) => existing.value = row.value.clone(),
            None => rows.push(row.clone()),
        }
        Ok(row)
    }

    fn delete_all(&self, environment: &str) -> Result<usize, StoreError> {
        Ok(self
            .environments
            .remove(environment)
            .map(|(_, rows)| rows.len())
            .unwrap_or(0))
    }
}

/// Transaction log keeping records in memory, keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    transactions: DashMap<String, Transaction>,
}

impl InMemoryTransactionLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionLog for InMemoryTransactionLog {
    fn create(
        &self,
        session: &str,
        action: &str,
        method: HttpMethod,
        request_snapshot: Value,
    ) -> Result<Transaction, StoreError> {
        let transaction = Transaction::new(session, action, method, request_snapshot);
        self.transactions
            .insert(transaction.id.clone(), transaction.clone());
        Ok(transaction)
    }

    fn update(
        &self,
        id: &str,
        response_snapshot: Value,
        status: TransactionStatus,
    ) -> Result<Transaction, StoreError> {
        let mut entry = self
            .transactions
            .get_mut(id)
            .ok_or_else(|| StoreError::TransactionNotFound(id.to_string()))?;
        entry.finish(response_snapshot, status);
        Ok(entry.clone())
    }

    fn get(&self, id: &str) -> Result<Option<Transaction>, StoreError> {
        Ok(self.transactions.get(id).map(|entry| entry.clone()))
    }

    fn list_all(&self) -> Result<Vec<Transaction>, StoreError> {
        let mut all: Vec<Transaction> = self
            .transactions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_upsert_then_list() {
        let store = InMemoryVariableStore::new();
        store.upsert("dev", "host", json!("a")).unwrap();
        store.upsert("dev", "port", json!(8080)).unwrap();

        let rows = store.list("dev").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].variable, "host");
        assert_eq!(rows[1].value, json!(8080));
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let store = InMemoryVariableStore::new();
        store.upsert("dev", "host", json!("a")).unwrap();
        store.upsert("dev", "host", json!("b")).unwrap();

        let rows = store.list("dev").unwrap();
        assert_eq!(rows.len(), 1, "upsert must not insert a duplicate row");
        assert_eq!(rows[0].value, json!("b"));
    }

    #[test]
    fn test_environments_are_disjoint() {
        let store = InMemoryVariableStore::new();
        store.upsert("dev", "host", json!("dev-host")).unwrap();
        store.upsert("prod", "host", json!("prod-host")).unwrap();

        assert_eq!(store.list("dev").unwrap().len(), 1);
        assert_eq!(
            store.find("prod", "host").unwrap().unwrap().value,
            json!("prod-host")
        );
        assert!(store.find("prod", "missing").unwrap().is_none());
    }

    #[test]
    fn test_delete_all() {
        let store = InMemoryVariableStore::new();
        store.upsert("dev", "a", json!(1)).unwrap();
        store.upsert("dev", "b", json!(2)).unwrap();
        store.upsert("prod", "a", json!(3)).unwrap();

        assert_eq!(store.delete_all("dev").unwrap(), 2);
        assert!(store.list("dev").unwrap().is_empty());
        assert_eq!(store.list("prod").unwrap().len(), 1);
        assert_eq!(store.delete_all("dev").unwrap(), 0);
    }

    #[test]
    fn test_concurrent_upserts_lose_nothing() {
        let store = Arc::new(InMemoryVariableStore::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for j in 0..50 {
                    store
                        .upsert("dev", &format!("var_{}_{}", i, j), json!(j))
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.list("dev").unwrap().len(), 8 * 50);
    }

    #[test]
    fn test_concurrent_same_key_upserts_keep_one_row() {
        let store = Arc::new(InMemoryVariableStore::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    store.upsert("dev", "shared", json!(i)).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let rows = store.list("dev").unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].value.is_number());
    }

    #[test]
    fn test_transaction_create_and_get() {
        let log = InMemoryTransactionLog::new();
        let txn = log
            .create("s-1", "login", HttpMethod::POST, json!({"url": "http://x"}))
            .unwrap();

        assert_eq!(txn.status, TransactionStatus::Pending);
        let fetched = log.get(&txn.id).unwrap().unwrap();
        assert_eq!(fetched.id, txn.id);
        assert!(log.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_transaction_update() {
        let log = InMemoryTransactionLog::new();
        let txn = log.create("s-1", "login", HttpMethod::GET, Value::Null).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2));
        let updated = log
            .update(&txn.id, json!({"status": 200}), TransactionStatus::Success)
            .unwrap();

        assert_eq!(updated.status, TransactionStatus::Success);
        assert!(updated.updated_at > updated.created_at);
        assert_eq!(log.get(&txn.id).unwrap().unwrap().status, TransactionStatus::Success);
    }

    #[test]
    fn test_update_unknown_id_fails() {
        let log = InMemoryTransactionLog::new();
        let result = log.update("missing", Value::Null, TransactionStatus::Error);
        assert!(matches!(result, Err(StoreError::TransactionNotFound(_))));
    }

    #[test]
    fn test_list_all_ordered_oldest_first() {
        let log = InMemoryTransactionLog::new();
        let first = log.create("s", "a", HttpMethod::GET, Value::Null).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = log.create("s", "b", HttpMethod::GET, Value::Null).unwrap();

        let all = log.list_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[1].id, second.id);
    }
}
