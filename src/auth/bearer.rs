//! Bearer token authentication implementation (RFC 6750).

/// Formats a token into a Bearer authentication header value.
///
/// # Examples
///
/// ```
/// use reqcap::auth::bearer::bearer_token;
///
/// let auth_header = bearer_token("abc123xyz");
/// assert_eq!(auth_header, "Bearer abc123xyz");
/// ```
pub fn bearer_token(token: &str) -> String {
    format!("Bearer {}", token.trim())
}
