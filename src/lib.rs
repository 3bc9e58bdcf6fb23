//! REST Orchestrator
//!
//! This crate executes HTTP calls described abstractly — a URL, headers,
//! and body containing `{{placeholders}}` — against a named environment of
//! stored variables. Each call is resolved, executed, recorded as a
//! transaction, and can capture parts of its response back into the
//! environment for later calls.
//!
//! # Architecture
//!
//! - **models**: core data structures — [`CallRequest`], [`CallResponse`],
//!   [`Transaction`]
//! - **resolve**: the four-pass resolution pipeline (variables →
//!   constants → base64 → filter expressions) and the per-call
//!   [`CallConstants`]
//! - **filter**: the jq-style filter evaluator collaborator
//! - **store**: variable store and transaction log collaborators, with
//!   in-memory and JSONL file-backed implementations
//! - **executor**: the call orchestrator and the HTTP transport
//! - **codec**: loose JSON decoding helpers
//! - **session**: session-id generation
//!
//! # Example
//!
//! ```no_run
//! use rest_orchestrator::{
//!     CallRequest, ExecutionConfig, HttpMethod, InMemoryTransactionLog,
//!     InMemoryVariableStore, JsonFilter, Orchestrator, ReqwestTransport,
//! };
//! use rest_orchestrator::store::VariableStore;
//! use serde_json::json;
//! use std::collections::BTreeMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let variables = InMemoryVariableStore::new();
//! variables.upsert("dev", "baseUrl", json!("https://api.example.com"))?;
//!
//! let orchestrator = Orchestrator::new(
//!     variables,
//!     InMemoryTransactionLog::new(),
//!     JsonFilter::new(),
//!     ReqwestTransport::new(&ExecutionConfig::default())?,
//! );
//!
//! let mut post_script = BTreeMap::new();
//! post_script.insert(
//!     "{{AUTH_TOKEN}}".to_string(),
//!     "filter_expression('.token', $RESPONSE_BODY)".to_string(),
//! );
//!
//! let request = CallRequest::new(
//!     HttpMethod::POST,
//!     "{{baseUrl}}/auth/login",
//!     "login",
//!     "dev",
//!     rest_orchestrator::session::new_session_id(),
//! )
//! .with_body(json!({"user": "{{user}}"}))
//! .with_post_script(post_script);
//!
//! let response = orchestrator.execute(&request).await?;
//! println!("{} -> {}", response.status, response.body);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod executor;
pub mod filter;
pub mod models;
pub mod resolve;
pub mod session;
pub mod store;

pub use executor::{
    CaptureOutcome, ExecutionConfig, HttpTransport, Orchestrator, OrchestrationError,
    ReqwestTransport, TransportError, TransportRequest, TransportResponse,
};
pub use filter::{FilterError, FilterEvaluator, JsonFilter};
pub use models::{CallRequest, CallResponse, HttpMethod, Transaction, TransactionStatus};
pub use resolve::{resolve, CallConstants, ResolveError};
pub use store::{
    FileTransactionLog, FileVariableStore, InMemoryTransactionLog, InMemoryVariableStore,
    StoreError, TransactionLog, VariableRow, VariableStore,
};
