//! Response output.
//!
//! Renders the root response of a run as the plain-text report printed on
//! stdout:
//!
//! ```text
//! STATUS: 200
//! TIME: 45ms
//! HEADERS:
//!   Content-Type: application/json
//! BODY:
//! {
//!   "id": 1
//! }
//! ```
//!
//! `STATUS` can be switched off by a filter, `HEADERS` only appears in
//! verbose mode or when the filter asks for it, and `BODY` is left out for
//! responses without a body.

use crate::assertions::AssertionResult;
use crate::chain::ChainOutcome;
use crate::config::FilterConfig;
use crate::models::HttpResponse;
use crate::snapshot::Change;
use serde_json::Value;

/// Which sections of a response to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections {
    pub status: bool,
    pub headers: bool,
}

impl Sections {
    /// Sections for a filter; `verbose` forces headers on.
    pub fn from_filter(filter: Option<&FilterConfig>, verbose: bool) -> Self {
        match filter {
            Some(filter) => Self {
                status: filter.status,
                headers: verbose || filter.headers,
            },
            None => Self {
                status: true,
                headers: verbose,
            },
        }
    }
}

/// A response laid out for display.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedResponse {
    pub status_line: Option<String>,
    pub time_line: String,
    /// `name: value` lines, empty when headers are hidden.
    pub header_lines: Vec<String>,
    /// Rendered body, `None` for a `null` body.
    pub body: Option<String>,
}

impl FormattedResponse {
    pub fn to_display_string(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        if let Some(status) = &self.status_line {
            lines.push(status.clone());
        }
        lines.push(self.time_line.clone());
        if !self.header_lines.is_empty() {
            lines.push("HEADERS:".to_string());
            lines.extend(self.header_lines.iter().map(|line| format!("  {}", line)));
        }
        if let Some(body) = &self.body {
            lines.push("BODY:".to_string());
            lines.push(body.clone());
        }
        lines.join("\n")
    }
}

/// Lays out `response` with an already filtered `body`.
///
/// # Arguments
///
/// * `response` - The response to report on
/// * `body` - The body to print, usually the filtered one
/// * `sections` - Which optional sections to include
pub fn format_response(response: &HttpResponse, body: &Value, sections: Sections) -> FormattedResponse {
    let header_lines = if sections.headers {
        response
            .headers
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect()
    } else {
        Vec::new()
    };

    FormattedResponse {
        status_line: sections
            .status
            .then(|| format!("STATUS: {}", response.status_code)),
        time_line: format!("TIME: {}ms", response.elapsed_ms()),
        header_lines,
        body: format_body(body),
    }
}

/// Renders the outcome of a run for stdout.
pub fn format_outcome(outcome: &ChainOutcome, verbose: bool) -> String {
    let sections = Sections::from_filter(outcome.filter.as_ref(), verbose);
    format_response(&outcome.response, &outcome.body, sections).to_display_string()
}

/// Renders a body: structured values as indented JSON, strings as-is.
///
/// Returns `None` for `null`.
pub fn format_body(body: &Value) -> Option<String> {
    match body {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(format_json(other)),
    }
}

/// `--raw` output: the unfiltered body and nothing else.
pub fn format_raw(response: &HttpResponse) -> String {
    format_body(&response.body).unwrap_or_default()
}

/// Pretty-prints a value with two-space indentation.
pub fn format_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// One line per assertion, in evaluation order.
pub fn format_assertions(results: &[AssertionResult]) -> String {
    results
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Snapshot comparison report, one indented line per change.
pub fn format_diff(changes: &[Change]) -> String {
    if changes.is_empty() {
        return "No differences.".to_string();
    }
    let mut lines = vec!["Differences found:".to_string()];
    lines.extend(changes.iter().map(|change| format!("  {}", change)));
    lines.join("\n")
}
