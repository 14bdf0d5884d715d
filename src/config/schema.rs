//! Configuration schema for reqcap.
//!
//! This module defines the structure of `.reqcap.yaml` and its validation.
//! All settings live under a single `defaults` section:
//!
//! ```yaml
//! defaults:
//!   base_url: http://localhost:3000
//!   timeout: 30
//!   headers:
//!     Content-Type: application/json
//!   auth:
//!     type: bearer
//!     token: ${API_TOKEN}
//!   filter:
//!     body_fields: [data, total]
//! ```

use super::ConfigError;
use crate::auth::AuthConfig;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Timeout used when neither the command line nor the config sets one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReqcapConfig {
    /// Defaults applied to every request.
    #[serde(default, deserialize_with = "null_as_default")]
    pub defaults: Defaults,
}

/// Treats an explicit YAML null (`key:` with nothing after it) like a
/// missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Request defaults and resource locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Base URL that relative template URLs are joined to.
    pub base_url: Option<String>,

    /// Path of a `.env` file, relative to the config file.
    pub env_file: Option<String>,

    /// Request timeout in seconds.
    ///
    /// Must be greater than 0. Defaults to 30 seconds.
    pub timeout: u64,

    /// Templates directory, relative to the config file.
    pub templates_dir: Option<String>,

    /// Snapshots directory, relative to the config file.
    pub snapshots_dir: Option<String>,

    /// Headers sent with every request unless a template overrides them.
    #[serde(deserialize_with = "null_as_default")]
    pub headers: IndexMap<String, String>,

    /// Auth used when a template declares none.
    pub auth: Option<AuthConfig>,

    /// Output filter used when neither the command line nor the template
    /// sets one.
    pub filter: Option<FilterConfig>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            base_url: None,
            env_file: None,
            timeout: DEFAULT_TIMEOUT_SECS,
            templates_dir: None,
            snapshots_dir: None,
            headers: IndexMap::new(),
            auth: None,
            filter: None,
        }
    }
}

/// What parts of a response to print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Print the status line.
    pub status: bool,
    /// Print response headers.
    pub headers: bool,
    /// Body paths to keep; empty keeps the whole body.
    pub body_fields: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            status: true,
            headers: false,
            body_fields: Vec::new(),
        }
    }
}

impl FilterConfig {
    /// Filter keeping only the given body fields.
    pub fn with_body_fields(body_fields: Vec<String>) -> Self {
        Self {
            body_fields,
            ..Self::default()
        }
    }
}

/// A template's `filter` section. Keys it leaves out keep the config's value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_fields: Option<Vec<String>>,
}

impl FilterOverride {
    /// Overlays the keys set here onto `base`.
    pub fn apply(&self, base: FilterConfig) -> FilterConfig {
        FilterConfig {
            status: self.status.unwrap_or(base.status),
            headers: self.headers.unwrap_or(base.headers),
            body_fields: self.body_fields.clone().unwrap_or(base.body_fields),
        }
    }
}

impl ReqcapConfig {
    /// Parses a YAML document. An empty document yields the defaults.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Option<ReqcapConfig> = serde_yaml::from_str(text)?;
        Ok(config.unwrap_or_default())
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a setting is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.defaults.timeout == 0 {
            return Err(ConfigError::Invalid(
                "timeout must be greater than 0".to_string(),
            ));
        }
        if let Some(base_url) = &self.defaults.base_url {
            if base_url.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "base_url must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReqcapConfig::default();
        assert_eq!(config.defaults.timeout, 30);
        assert!(config.defaults.base_url.is_none());
        assert!(config.defaults.headers.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
defaults:
  base_url: http://localhost:3000
  timeout: 10
  env_file: .env.local
  templates_dir: api/templates
  headers:
    Content-Type: application/json
    Accept: application/json
  auth:
    type: api-key
    token: ${KEY}
  filter:
    headers: true
    body_fields: [data, total]
"#;
        let config = ReqcapConfig::from_yaml(yaml).unwrap();
        let defaults = &config.defaults;
        assert_eq!(defaults.base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(defaults.timeout, 10);
        assert_eq!(defaults.env_file.as_deref(), Some(".env.local"));
        assert_eq!(defaults.templates_dir.as_deref(), Some("api/templates"));
        let header_names: Vec<&String> = defaults.headers.keys().collect();
        assert_eq!(header_names, vec!["Content-Type", "Accept"]);
        assert!(matches!(defaults.auth, Some(AuthConfig::ApiKey { .. })));

        let filter = defaults.filter.as_ref().unwrap();
        assert!(filter.status);
        assert!(filter.headers);
        assert_eq!(filter.body_fields, vec!["data", "total"]);
    }

    #[test]
    fn test_filter_override_keeps_unset_keys() {
        let base = FilterConfig {
            status: false,
            headers: true,
            body_fields: vec!["data".to_string()],
        };
        let only_fields: FilterOverride = serde_yaml::from_str("body_fields: [id]").unwrap();
        assert_eq!(
            only_fields.apply(base.clone()),
            FilterConfig {
                status: false,
                headers: true,
                body_fields: vec!["id".to_string()],
            }
        );

        let only_headers: FilterOverride = serde_yaml::from_str("headers: false").unwrap();
        assert_eq!(
            only_headers.apply(base),
            FilterConfig {
                status: false,
                headers: false,
                body_fields: vec!["data".to_string()],
            }
        );
        assert_eq!(FilterOverride::default().apply(FilterConfig::default()), FilterConfig::default());
    }

    #[test]
    fn test_empty_documents_use_defaults() {
        assert_eq!(ReqcapConfig::from_yaml("").unwrap(), ReqcapConfig::default());
        assert_eq!(
            ReqcapConfig::from_yaml("defaults:\n").unwrap().defaults.timeout,
            30
        );
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let config = ReqcapConfig::from_yaml("defaults:\n  timeout: 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
