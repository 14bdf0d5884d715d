//! Basic HTTP authentication implementation.
//!
//! This module encodes HTTP Basic authentication credentials according to
//! RFC 7617.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Encodes username and password into a Basic authentication header value.
///
/// # Examples
///
/// ```
/// use reqcap::auth::basic::basic_auth;
///
/// let auth_header = basic_auth("user", "pass123");
/// assert_eq!(auth_header, "Basic dXNlcjpwYXNzMTIz");
/// ```
pub fn basic_auth(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    let encoded = STANDARD.encode(credentials.as_bytes());
    format!("Basic {}", encoded)
}

/// Splits a `user:password` pair as passed to curl's `-u`.
///
/// The password may itself contain colons; a missing password is empty.
pub fn split_credentials(pair: &str) -> (String, String) {
    match pair.split_once(':') {
        Some((user, password)) => (user.to_string(), password.to_string()),
        None => (pair.to_string(), String::new()),
    }
}
