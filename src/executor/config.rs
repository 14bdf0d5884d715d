//! HTTP request execution configuration.

use crate::config::{Defaults, DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for HTTP request execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Request timeout in seconds.
    ///
    /// Maximum time to wait for a complete response (including connection,
    /// headers, and body download).
    pub timeout_secs: u64,
}

impl ExecutionConfig {
    /// Creates a new ExecutionConfig with the given timeout.
    ///
    /// # Arguments
    ///
    /// * `timeout_secs` - Timeout duration in seconds
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    /// Picks the timeout: command line first, then the config defaults.
    ///
    /// A zero value from either source is ignored.
    pub fn resolve(cli_timeout: Option<u64>, defaults: &Defaults) -> Self {
        let timeout_secs = cli_timeout
            .into_iter()
            .chain(Some(defaults.timeout))
            .find(|t| *t > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self { timeout_secs }
    }

    /// Returns the timeout as a `std::time::Duration`.
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_SECS)
    }
}
