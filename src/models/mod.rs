//! Core data models: call requests, call responses, and transaction
//! audit records.

pub mod request;
pub mod response;
pub mod transaction;

pub use request::{CallRequest, HttpMethod};
pub use response::CallResponse;
pub use transaction::{Transaction, TransactionStatus};
