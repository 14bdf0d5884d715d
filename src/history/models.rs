//! Data models for request history.

use crate::models::{FormField, HttpMethod, HttpRequest};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header names that are never written to history.
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "api-key",
    "auth-token",
    "x-auth-token",
    "access-token",
    "x-access-token",
];

/// A request as it was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub method: HttpMethod,
    pub url: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Multipart fields; file parts keep their path, not their contents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub form: Vec<FormField>,
    /// Template the request came from; `None` for direct requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl HistoryEntry {
    /// Records `request`, dropping sensitive headers.
    pub fn new(request: &HttpRequest, template: Option<&str>) -> Self {
        let headers = request
            .headers
            .iter()
            .filter(|(name, _)| !is_sensitive(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Self {
            timestamp: Utc::now(),
            method: request.method,
            url: request.url.clone(),
            headers,
            body: request.body.clone().filter(|b| !b.is_empty()),
            form: request.form.clone(),
            template: template.map(str::to_string),
        }
    }

    /// The request to send when replaying this entry.
    pub fn to_request(&self) -> HttpRequest {
        let mut request = HttpRequest::new(self.method, self.url.clone());
        request.headers = self.headers.clone();
        request.body = self.body.clone();
        request.form = self.form.clone();
        request
    }
}

/// Checks a header name against [`SENSITIVE_HEADERS`], ignoring case.
pub fn is_sensitive(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|sensitive| name.eq_ignore_ascii_case(sensitive))
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("no home directory to keep history in")]
    NoHomeDir,

    #[error("history storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("history serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid history index {index} ({count} entries); use --history to list")]
    InvalidIndex { index: usize, count: usize },
}
