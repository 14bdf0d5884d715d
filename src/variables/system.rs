//! Built-in placeholder values.
//!
//! `{{uuid}}`, `{{timestamp}}`, `{{timestamp_ms}}` and `{{date}}` are
//! generated at the moment each occurrence is expanded; two occurrences in
//! one template produce two independent values.

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

/// Resolves a built-in placeholder, or `None` if `token` is not one.
///
/// # Examples
///
/// ```
/// use reqcap::variables::system::resolve_builtin;
///
/// assert_eq!(resolve_builtin("uuid").unwrap().len(), 36);
/// assert!(resolve_builtin("token").is_none());
/// ```
pub fn resolve_builtin(token: &str) -> Option<String> {
    match token {
        "uuid" | "uuidv4" => Some(Uuid::new_v4().to_string()),
        "timestamp" => Some(Utc::now().timestamp().to_string()),
        "timestamp_ms" => Some(Utc::now().timestamp_millis().to_string()),
        "date" => Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        _ => None,
    }
}
