//! JSONL file-backed store implementations.
//!
//! Rows are persisted one JSON object per line. Transaction creation
//! appends; updates and variable upserts rewrite the file under an
//! internal lock, so the read-modify-write is atomic within the process.
//! Loading tolerates corruption: unparseable lines are skipped with a
//! warning instead of failing the whole read.

use super::{StoreError, TransactionLog, VariableRow, VariableStore};
use crate::models::{HttpMethod, Transaction, TransactionStatus};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Reads every well-formed row from a JSONL file.
///
/// A missing file is an empty store. Corrupted lines are skipped with a
/// warning.
fn load_rows<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut rows = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<R>(&line) {
            Ok(row) => rows.push(row),
            Err(e) => {
                log::warn!(
                    "skipping corrupted row at {}:{}: {}",
                    path.display(),
                    line_num + 1,
                    e
                );
            }
        }
    }

    Ok(rows)
}

/// Rewrites the whole JSONL file from the given rows.
fn save_rows<R: Serialize>(path: &Path, rows: &[R]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(path)?;
    for row in rows {
        let json = serde_json::to_string(row)?;
        writeln!(file, "{}", json)?;
    }
    file.flush()?;
    Ok(())
}

/// Appends one row to a JSONL file, creating it if needed.
fn append_row<R: Serialize>(path: &Path, row: &R) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(row)?;
    writeln!(file, "{}", json)?;
    file.flush()?;
    Ok(())
}

/// Variable store persisting rows to a JSONL file.
#[derive(Debug)]
pub struct FileVariableStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileVariableStore {
    /// Creates a store backed by the given file path. The file is created
    /// lazily on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

impl VariableStore for FileVariableStore {
    fn list(&self, environment: &str) -> Result<Vec<VariableRow>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let rows: Vec<VariableRow> = load_rows(&self.path)?;
        Ok(rows
            .into_iter()
            .filter(|row| row.environment == environment)
            .collect())
    }

    fn find(&self, environment: &str, variable: &str) -> Result<Option<VariableRow>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let rows: Vec<VariableRow> = load_rows(&self.path)?;
        Ok(rows
            .into_iter()
            .find(|row| row.environment == environment && row.variable == variable))
    }

    fn upsert(
        &self,
        environment: &str,
        variable: &str,
        value: Value,
    ) -> Result<VariableRow, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut rows: Vec<VariableRow> = load_rows(&self.path)?;
        let row = VariableRow::new(environment, variable, value);

        match rows
            .iter_mut()
            .find(|existing| existing.environment == environment && existing.variable == variable)
        {
            Some(existing) => existing.value = row.value.clone(),
            None => rows.push(row.clone()),
        }

        save_rows(&self.path, &rows)?;
        Ok(row)
    }

    fn delete_all(&self, environment: &str) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let rows: Vec<VariableRow> = load_rows(&self.path)?;
        let before = rows.len();
        let kept: Vec<VariableRow> = rows
            .into_iter()
            .filter(|row| row.environment != environment)
            .collect();
        let deleted = before - kept.len();

        if deleted > 0 {
            save_rows(&self.path, &kept)?;
        }
        Ok(deleted)
    }
}

/// Transaction log persisting records to a JSONL file.
///
/// Creation appends one line; the single terminal update rewrites the
/// file with the changed record.
#[derive(Debug)]
pub struct FileTransactionLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTransactionLog {
    /// Creates a log backed by the given file path. The file is created
    /// lazily on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

impl TransactionLog for FileTransactionLog {
    fn create(
        &self,
        session: &str,
        action: &str,
        method: HttpMethod,
        request_snapshot: Value,
    ) -> Result<Transaction, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let transaction = Transaction::new(session, action, method, request_snapshot);
        append_row(&self.path, &transaction)?;
        Ok(transaction)
    }

    fn update(
        &self,
        id: &str,
        response_snapshot: Value,
        status: TransactionStatus,
    ) -> Result<Transaction, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut rows: Vec<Transaction> = load_rows(&self.path)?;

        let entry = rows
            .iter_mut()
            .find(|txn| txn.id == id)
            .ok_or_else(|| StoreError::TransactionNotFound(id.to_string()))?;
        entry.finish(response_snapshot, status);
        let updated = entry.clone();

        save_rows(&self.path, &rows)?;
        Ok(updated)
    }

    fn get(&self, id: &str) -> Result<Option<Transaction>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let rows: Vec<Transaction> = load_rows(&self.path)?;
        Ok(rows.into_iter().find(|txn| txn.id == id))
    }

    fn list_all(&self) -> Result<Vec<Transaction>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        load_rows(&self.path)
    }
}
