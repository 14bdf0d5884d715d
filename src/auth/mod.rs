//! HTTP authentication.
//!
//! Templates and the config defaults declare auth as a tagged mapping:
//!
//! ```yaml
//! auth:
//!   type: bearer        # or api-key, basic, none
//!   token: ${API_TOKEN}
//! ```
//!
//! Each variant turns into exactly one request header.

pub mod basic;
pub mod bearer;

use crate::models::request::HttpRequest;
use serde::{Deserialize, Serialize};

/// Default header used by `api-key` auth.
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

fn default_api_key_header() -> String {
    DEFAULT_API_KEY_HEADER.to_string()
}

/// Authentication declared by a template or the config defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AuthConfig {
    /// No authentication
    None,
    /// Bearer token authentication (RFC 6750)
    Bearer { token: String },
    /// Token sent in a custom header
    ApiKey {
        token: String,
        #[serde(default = "default_api_key_header")]
        header: String,
    },
    /// HTTP Basic authentication (RFC 7617)
    Basic { username: String, password: String },
}

impl AuthConfig {
    /// The header this auth adds, or `None` for [`AuthConfig::None`].
    pub fn header(&self) -> Option<(String, String)> {
        match self {
            AuthConfig::None => None,
            AuthConfig::Bearer { token } => {
                Some(("Authorization".to_string(), bearer::bearer_token(token)))
            }
            AuthConfig::ApiKey { token, header } => Some((header.clone(), token.clone())),
            AuthConfig::Basic { username, password } => Some((
                "Authorization".to_string(),
                basic::basic_auth(username, password),
            )),
        }
    }

    /// Rebuilds the auth with every credential passed through `f`.
    ///
    /// Used to expand placeholders and `$VAR` references in credentials. The
    /// api-key header name is left untouched.
    pub fn map_credentials<E, F>(&self, mut f: F) -> Result<AuthConfig, E>
    where
        F: FnMut(&str) -> Result<String, E>,
    {
        Ok(match self {
            AuthConfig::None => AuthConfig::None,
            AuthConfig::Bearer { token } => AuthConfig::Bearer { token: f(token)? },
            AuthConfig::ApiKey { token, header } => AuthConfig::ApiKey {
                token: f(token)?,
                header: header.clone(),
            },
            AuthConfig::Basic { username, password } => AuthConfig::Basic {
                username: f(username)?,
                password: f(password)?,
            },
        })
    }
}

/// Applies authentication to an HTTP request, replacing any header of the
/// same name regardless of case.
pub fn apply_authentication(request: &mut HttpRequest, auth: &AuthConfig) {
    if let Some((name, value)) = auth.header() {
        request.set_header(&name, value);
    }
}
