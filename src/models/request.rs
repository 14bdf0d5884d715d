//! HTTP request data models.
//!
//! This module defines the request that is handed to an executor once a
//! template has been fully resolved: method, absolute URL, headers and body.
//! The body is either raw text or a list of multipart form fields.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// HTTP request method.
///
/// Represents all standard HTTP methods as defined in RFC 7231 and RFC 5789.
/// Parsing is case-insensitive, so templates may write `post` or `POST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    #[default]
    GET,
    /// HTTP POST method - submit data to create a resource
    POST,
    /// HTTP PUT method - replace a resource
    PUT,
    /// HTTP DELETE method - remove a resource
    DELETE,
    /// HTTP PATCH method - partially modify a resource
    PATCH,
    /// HTTP OPTIONS method - describe communication options
    OPTIONS,
    /// HTTP HEAD method - retrieve headers only
    HEAD,
    /// HTTP TRACE method - perform a message loop-back test
    TRACE,
    /// HTTP CONNECT method - establish a tunnel to the server
    CONNECT,
}

impl HttpMethod {
    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::TRACE => "TRACE",
            HttpMethod::CONNECT => "CONNECT",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::GET),
            "POST" => Ok(HttpMethod::POST),
            "PUT" => Ok(HttpMethod::PUT),
            "DELETE" => Ok(HttpMethod::DELETE),
            "PATCH" => Ok(HttpMethod::PATCH),
            "OPTIONS" => Ok(HttpMethod::OPTIONS),
            "HEAD" => Ok(HttpMethod::HEAD),
            "TRACE" => Ok(HttpMethod::TRACE),
            "CONNECT" => Ok(HttpMethod::CONNECT),
            _ => Err(format!("unknown HTTP method '{}'", s)),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value of one multipart form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormValue {
    /// Plain text part.
    Text(String),
    /// File part, read when the request is sent.
    File(PathBuf),
}

/// One `--form` field: `KEY=VALUE`, or `KEY=@FILE` for a file upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(flatten)]
    pub value: FormValue,
}

impl FormField {
    /// Parses `KEY=VALUE` or `KEY=@FILE`. The value may contain `=` and
    /// may be empty; the key may not.
    pub fn parse(spec: &str) -> Option<Self> {
        let (name, value) = spec.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let value = match value.strip_prefix('@') {
            Some(path) => FormValue::File(PathBuf::from(path)),
            None => FormValue::Text(value.to_string()),
        };
        Some(Self {
            name: name.to_string(),
            value,
        })
    }
}

/// A fully resolved HTTP request, ready for an executor.
///
/// Every placeholder has been expanded and the URL is absolute. Header names
/// keep the spelling they were declared with; lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// HTTP method (GET, POST, PUT, DELETE, etc.).
    pub method: HttpMethod,

    /// Absolute target URL.
    pub url: String,

    /// Request headers in the order they were applied.
    #[serde(default)]
    pub headers: IndexMap<String, String>,

    /// Optional serialized request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Multipart form fields. When present they are sent instead of `body`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub form: Vec<FormField>,
}

impl HttpRequest {
    /// Creates a new request without headers or body.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: IndexMap::new(),
            body: None,
            form: Vec::new(),
        }
    }

    /// Sends `form` as multipart/form-data.
    ///
    /// Any declared Content-Type is dropped; the executor sets one carrying
    /// the multipart boundary.
    pub fn set_form(&mut self, form: Vec<FormField>) {
        self.headers
            .retain(|key, _| !key.eq_ignore_ascii_case("content-type"));
        self.body = None;
        self.form = form;
    }

    /// Checks if the request is sent as multipart/form-data.
    pub fn is_multipart(&self) -> bool {
        !self.form.is_empty()
    }

    /// Sets a header, replacing any existing header with the same name
    /// regardless of case.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.into());
    }

    /// Looks up a header value case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Checks if the request has a non-empty body.
    pub fn has_body(&self) -> bool {
        self.body.as_ref().is_some_and(|b| !b.is_empty())
    }

    /// Gets the Content-Type header value if present.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}
