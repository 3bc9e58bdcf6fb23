//! Session identifier generation.
//!
//! A session groups the transactions of a sequence of related calls. Ids
//! are random UUIDs, generated fresh per session and never reused.

use uuid::Uuid;

/// Generates a new session identifier (UUID v4).
///
/// # Examples
///
/// ```
/// use rest_orchestrator::session::new_session_id;
///
/// let id = new_session_id();
/// assert_eq!(id.len(), 36);
/// ```
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}
