//! HTTP request executor.
//!
//! The chain only talks to the network through [`HttpExecutor`]. The
//! production implementation is [`ReqwestExecutor`]; tests substitute
//! recording fakes.

pub mod config;
pub mod error;
pub mod native;

pub use config::ExecutionConfig;
pub use error::RequestError;
pub use native::{validate_url, ReqwestExecutor};

use crate::models::request::HttpRequest;
use crate::models::response::HttpResponse;
use std::time::Duration;

/// Sends a fully built request and returns the response envelope.
pub trait HttpExecutor {
    /// Executes `request`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a `RequestError` for anything that prevented a response from
    /// being received. Non-2xx statuses are responses, not errors.
    fn execute(&self, request: &HttpRequest, timeout: Duration)
        -> Result<HttpResponse, RequestError>;
}

impl<T: HttpExecutor + ?Sized> HttpExecutor for &T {
    fn execute(
        &self,
        request: &HttpRequest,
        timeout: Duration,
    ) -> Result<HttpResponse, RequestError> {
        (**self).execute(request, timeout)
    }
}
