//! HTTP response data models.
//!
//! An [`HttpResponse`] is what an executor hands back: status, headers, the
//! body as a structured value and the elapsed time. Exports, assertions and
//! snapshot diffs all read from it through path expressions.

use crate::path::{select, PathExpr};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Top-level names that address the response itself rather than its body.
const ENVELOPE_FIELDS: &[&str] = &["status", "headers", "body"];

/// Response envelope returned by an executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code (e.g., 200, 404, 500).
    pub status_code: u16,

    /// Response headers as received.
    #[serde(default)]
    pub headers: IndexMap<String, String>,

    /// Parsed JSON body, the raw text when the body is not JSON, or `null`
    /// when the response had no body.
    #[serde(default)]
    pub body: Value,

    /// Wall-clock time from sending the request to reading the full body.
    #[serde(default)]
    pub elapsed: Duration,
}

impl HttpResponse {
    /// Creates a response with a status code and body, no headers.
    pub fn new(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            headers: IndexMap::new(),
            body,
            elapsed: Duration::ZERO,
        }
    }

    /// Builds a response from raw body bytes.
    ///
    /// Bodies that parse as JSON become structured values, empty bodies
    /// become `null` and anything else is kept as text.
    pub fn from_raw(
        status_code: u16,
        headers: IndexMap<String, String>,
        raw_body: &[u8],
        elapsed: Duration,
    ) -> Self {
        let body = if raw_body.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(raw_body).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(raw_body).into_owned())
            })
        };
        Self {
            status_code,
            headers,
            body,
            elapsed,
        }
    }

    /// Elapsed time in whole milliseconds.
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// Checks if the response indicates success (2xx status code).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Looks up a header value case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The response as one document: `{status, headers, body}`.
    pub fn envelope(&self) -> Value {
        json!({
            "status": self.status_code,
            "headers": self.headers,
            "body": self.body,
        })
    }

    /// Reads a value from the response through a path.
    ///
    /// Paths starting with `status`, `headers` or `body` address the
    /// envelope; any other path is read from the body, so `token` and
    /// `body.token` are equivalent.
    pub fn extract(&self, expr: &PathExpr) -> Option<Value> {
        let addresses_envelope = expr.leading_field().is_some_and(|name| {
            ENVELOPE_FIELDS
                .iter()
                .any(|field| field.eq_ignore_ascii_case(name))
        });
        if addresses_envelope {
            select(expr, &self.envelope())
        } else {
            select(expr, &self.body)
        }
    }
}

/// Renders a value the way exports and assertions compare it: strings as
/// their raw text, `null` as an empty string, everything else as compact JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HttpResponse {
        let mut headers = IndexMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("X-Request-Id".to_string(), "abc".to_string());
        HttpResponse {
            status_code: 201,
            headers,
            body: json!({"access_token": "tok", "status": "active", "items": [1, 2]}),
            elapsed: Duration::from_millis(42),
        }
    }

    fn extract(response: &HttpResponse, path: &str) -> Option<Value> {
        response.extract(&PathExpr::parse(path).unwrap())
    }

    #[test]
    fn test_from_raw_parses_json() {
        let response =
            HttpResponse::from_raw(200, IndexMap::new(), br#"{"a":1}"#, Duration::ZERO);
        assert_eq!(response.body, json!({"a": 1}));
    }

    #[test]
    fn test_from_raw_keeps_text_and_nulls_empty() {
        let text = HttpResponse::from_raw(200, IndexMap::new(), b"hello", Duration::ZERO);
        assert_eq!(text.body, json!("hello"));

        let empty = HttpResponse::from_raw(204, IndexMap::new(), b"", Duration::ZERO);
        assert_eq!(empty.body, Value::Null);
    }

    #[test]
    fn test_extract_from_body_with_and_without_prefix() {
        let response = sample();
        assert_eq!(extract(&response, "body.access_token"), Some(json!("tok")));
        assert_eq!(extract(&response, "access_token"), Some(json!("tok")));
        assert_eq!(extract(&response, "items[-1]"), Some(json!(2)));
    }

    #[test]
    fn test_extract_from_envelope() {
        let response = sample();
        assert_eq!(extract(&response, "status"), Some(json!(201)));
        assert_eq!(extract(&response, "body.status"), Some(json!("active")));
        assert_eq!(extract(&response, "headers.x-request-id"), Some(json!("abc")));
        assert_eq!(extract(&response, "body.missing"), None);
    }

    #[test]
    fn test_status_helpers() {
        let response = sample();
        assert!(response.is_success());
        assert_eq!(response.elapsed_ms(), 42);
        assert_eq!(response.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!("a b")), "a b");
        assert_eq!(value_to_text(&json!(12)), "12");
        assert_eq!(value_to_text(&json!(true)), "true");
        assert_eq!(value_to_text(&Value::Null), "");
        assert_eq!(value_to_text(&json!([1, 2])), "[1,2]");
    }
}
