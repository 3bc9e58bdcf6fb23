//! Call execution configuration.
//!
//! Defines the parameters controlling how the outbound HTTP call is
//! executed, currently the request timeout.

use serde::{Deserialize, Serialize};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the default timeout.
pub const TIMEOUT_ENV_VAR: &str = "DEFAULT_HTTP_TIMEOUT";

/// Configuration for outbound call execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Request timeout in seconds.
    ///
    /// Maximum time to wait for a complete response (connection, headers,
    /// and body). Defaults to 30 seconds.
    pub timeout_secs: u64,
}

impl ExecutionConfig {
    /// Creates a new ExecutionConfig with the given timeout.
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    /// Creates a config from the environment, falling back to defaults.
    ///
    /// Reads `DEFAULT_HTTP_TIMEOUT`; an unparseable value is warned about
    /// and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(TIMEOUT_ENV_VAR) {
            match raw.parse::<u64>() {
                Ok(secs) => config.timeout_secs = secs,
                Err(_) => {
                    log::warn!(
                        "invalid {}='{}', keeping default {}s",
                        TIMEOUT_ENV_VAR,
                        raw,
                        config.timeout_secs
                    );
                }
            }
        }
        config
    }

    /// Returns the timeout as a `std::time::Duration`.
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}
