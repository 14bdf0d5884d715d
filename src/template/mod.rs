//! Request templates.
//!
//! A template is a YAML document describing one request plus how it takes
//! part in a chain:
//!
//! ```yaml
//! name: create-user
//! method: POST
//! url: /users
//! headers:
//!   X-Trace: "{{uuid}}"
//! auth:
//!   type: bearer
//!   token: "{{token}}"
//! body:
//!   user:
//!     name: placeholder
//! fields:
//!   - name: username
//!     path: user.name
//! exports:
//!   user_id: body.id
//! depends: [login]
//! snapshot:
//!   enabled: true
//! ```
//!
//! Templates are immutable once loaded; everything request-specific is
//! derived from them per chain step.

pub mod error;
pub mod loader;

pub use error::TemplateError;
pub use loader::{FsTemplateLoader, TemplateSource};

use crate::auth::AuthConfig;
use crate::config::schema::null_as_default;
use crate::config::FilterOverride;
use crate::models::{HttpMethod, HttpRequest};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Name given to templates built from the command line rather than a file.
pub const ADHOC_TEMPLATE_NAME: &str = "direct";

/// A request template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Defaults to the file stem when omitted.
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub method: HttpMethod,

    /// Absolute URL, or a path joined to the effective base URL.
    pub url: String,

    /// Overrides the configured base URL for this template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Variables injected into the body at a path.
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<FieldBinding>,

    /// Export name to response path, e.g. `token: body.access_token`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub exports: IndexMap<String, String>,

    /// Output filter; keys left out fall back to the config's filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterOverride>,

    /// Templates that must run first, in declared order.
    #[serde(default, deserialize_with = "one_or_many")]
    pub depends: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub snapshot: SnapshotConfig,
}

/// Binds a variable to a location in the request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBinding {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl FieldBinding {
    /// The body path the variable is written to; defaults to its name.
    pub fn target(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }
}

/// Whether a template saves its response as a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub enabled: bool,
    /// Snapshot key; the template name when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Accepts `depends: login` as well as `depends: [login, setup]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(name)) => vec![name],
        Some(OneOrMany::Many(names)) => names,
    })
}

impl Template {
    /// Parses a template document. `fallback_name` is used when the document
    /// has no `name`.
    pub fn from_yaml(text: &str, fallback_name: &str) -> Result<Self, serde_yaml::Error> {
        let mut template: Template = serde_yaml::from_str(text)?;
        if template.name.trim().is_empty() {
            template.name = fallback_name.to_string();
        }
        Ok(template)
    }

    /// A single-request template built from the command line.
    pub fn adhoc(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            name: ADHOC_TEMPLATE_NAME.to_string(),
            description: None,
            method,
            url: url.into(),
            base_url: None,
            headers: IndexMap::new(),
            auth: None,
            body: None,
            fields: Vec::new(),
            exports: IndexMap::new(),
            filter: None,
            depends: Vec::new(),
            snapshot: SnapshotConfig::default(),
        }
    }

    /// An ad-hoc template that re-sends an already built request, as used by
    /// history replay and curl import.
    ///
    /// A body holding a JSON object or array is kept structured; any other
    /// body is sent as text.
    pub fn from_request(request: HttpRequest) -> Self {
        let mut template = Self::adhoc(request.method, request.url);
        template.headers = request.headers;
        template.body = request.body.map(|text| match serde_json::from_str::<Value>(&text) {
            Ok(value) if value.is_object() || value.is_array() => value,
            _ => Value::String(text),
        });
        template
    }

    /// Key the response is saved under when snapshots are enabled.
    pub fn snapshot_name(&self) -> Option<&str> {
        self.snapshot
            .enabled
            .then(|| self.snapshot.name.as_deref().unwrap_or(&self.name))
    }
}
