//! HTTP request execution error types.
//!
//! This module defines error types that can occur during HTTP request execution,
//! including network errors, timeouts, and protocol issues.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during HTTP request execution.
///
/// Any of these aborts the rest of a chain.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Network error occurred during request execution.
    ///
    /// This includes connection failures, DNS resolution errors,
    /// and other network-level issues.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out before completion.
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The URL could not be parsed or is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Certificate validation errors, handshake failures and other TLS
    /// issues.
    #[error("TLS/SSL error: {0}")]
    TlsError(String),

    /// Errors that occur when constructing the HTTP request.
    #[error("Request build error: {0}")]
    BuildError(String),

    /// Only HTTP and HTTPS are supported.
    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),
}

impl RequestError {
    /// Maps a reqwest error, using `timeout` to describe timeouts.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            RequestError::Timeout(timeout)
        } else if err.is_builder() {
            RequestError::BuildError(message)
        } else if message.contains("certificate") || message.contains("TLS") || message.contains("SSL")
        {
            RequestError::TlsError(message)
        } else if err.is_connect() {
            RequestError::NetworkError(format!("Connection failed: {}", message))
        } else {
            RequestError::NetworkError(message)
        }
    }
}

/// Convert URL parsing errors to RequestError.
impl From<url::ParseError> for RequestError {
    fn from(err: url::ParseError) -> Self {
        RequestError::InvalidUrl(err.to_string())
    }
}
