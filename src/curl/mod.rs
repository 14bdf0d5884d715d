//! cURL command import.
//!
//! `--import-curl "curl ..."` runs a pasted curl command through the normal
//! request path, so filters, assertions, exports and snapshots all apply.
//!
//! # Supported cURL Flags
//!
//! - `-X`, `--request` - HTTP method
//! - `-H`, `--header` - HTTP headers
//! - `-d`, `--data`, `--data-raw`, `--data-binary` - Request body (implies POST)
//! - `--json` - JSON body with JSON `Content-Type` and `Accept`
//! - `-u`, `--user` - Basic authentication
//! - `-A`, `--user-agent` - User-Agent header
//! - `--url` - Target URL
//!
//! Output, TLS and transport flags are skipped.

pub mod parser;

pub use parser::{parse_curl_command, ParseError};

use crate::template::Template;

/// Parses a curl command into a single-step template.
///
/// # Errors
///
/// Returns the `ParseError` of [`parse_curl_command`].
pub fn import_curl(curl_str: &str) -> Result<Template, ParseError> {
    parse_curl_command(curl_str).map(Template::from_request)
}
