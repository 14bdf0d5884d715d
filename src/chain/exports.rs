//! Exported values and the shell export protocol.
//!
//! Every export is announced on the diagnostic stream as
//! `export reqcap_<name>=<value>` so a shell can `eval` it.

use super::error::ChainError;
use crate::models::{value_to_text, HttpResponse};
use crate::path::{PathError, PathExpr};
use serde_json::Value;

/// Prefix for exported shell variables.
pub const EXPORT_PREFIX: &str = "reqcap";

/// Quotes a value for POSIX shells.
///
/// Values made only of ASCII alphanumerics and `-_=./:@` are left bare,
/// the empty string becomes `''`, anything else is single-quoted.
pub fn shell_quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    let is_safe = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_=./:@".contains(c));
    if is_safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

/// Formats the diagnostic line announcing an export.
pub fn export_line(name: &str, value: &str) -> String {
    format!("export {}_{}={}", EXPORT_PREFIX, name, shell_quote(value))
}

/// A named value to read from a response.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpec {
    pub name: String,
    pub path: PathExpr,
}

impl ExportSpec {
    pub fn new(name: impl Into<String>, path: &str) -> Result<Self, PathError> {
        Ok(Self {
            name: name.into(),
            path: PathExpr::parse(path)?,
        })
    }

    /// Parses a command-line export: `name=path`, or a bare `name` which
    /// reads `body.<name>`.
    pub fn parse_cli(spec: &str) -> Result<Self, ChainError> {
        let (name, path) = match spec.split_once('=') {
            Some((name, path)) => (name.trim(), path.trim().to_string()),
            None => (spec.trim(), format!("body.{}", spec.trim())),
        };
        if name.is_empty() {
            return Err(ChainError::InvalidExport {
                spec: spec.to_string(),
                reason: "missing name".to_string(),
            });
        }
        Self::new(name, &path).map_err(|e| ChainError::InvalidExport {
            spec: spec.to_string(),
            reason: e.to_string(),
        })
    }

    /// Reads the export from a response as text.
    ///
    /// Returns `None` when the path matches nothing or only `null`.
    pub fn extract(&self, response: &HttpResponse) -> Option<String> {
        match response.extract(&self.path)? {
            Value::Null => None,
            value => Some(value_to_text(&value)),
        }
    }
}
