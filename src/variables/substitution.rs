//! Placeholder interpolation.
//!
//! Replaces `{{token}}` occurrences inside strings. Tokens are trimmed and
//! resolved in this order: `env.NAME`, built-ins (`uuid`, `timestamp`,
//! `timestamp_ms`, `date`), then the variable table. Substitution is a single
//! pass; text produced by a substitution is never scanned again.

use super::system::resolve_builtin;
use super::{VarError, VariableTable};
use crate::environment::EnvProvider;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Cached regex pattern for matching `{{token}}`.
static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(.+?)\}\}").expect("Failed to compile placeholder regex"));

/// Expands placeholders for one template.
pub struct Interpolator<'a> {
    table: &'a VariableTable,
    env: &'a dyn EnvProvider,
    template: &'a str,
}

impl<'a> Interpolator<'a> {
    /// Creates an interpolator. `template` names the template in errors.
    pub fn new(table: &'a VariableTable, env: &'a dyn EnvProvider, template: &'a str) -> Self {
        Self {
            table,
            env,
            template,
        }
    }

    /// Expands every placeholder in `text`.
    ///
    /// # Errors
    ///
    /// Returns `VarError::MissingVariable` for the first placeholder that
    /// cannot be resolved.
    pub fn interpolate(&self, text: &str) -> Result<String, VarError> {
        if !text.contains("{{") {
            return Ok(text.to_string());
        }

        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        for caps in PLACEHOLDER_REGEX.captures_iter(text) {
            let (Some(whole), Some(token)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            output.push_str(&text[last..whole.start()]);
            output.push_str(&self.resolve(token.as_str().trim())?);
            last = whole.end();
        }
        output.push_str(&text[last..]);
        Ok(output)
    }

    /// Expands placeholders in every string inside a structured value.
    /// Object keys are left as written.
    pub fn interpolate_value(&self, value: &Value) -> Result<Value, VarError> {
        map_strings(value, &mut |text: &str| self.interpolate(text))
    }

    fn resolve(&self, token: &str) -> Result<String, VarError> {
        if let Some(name) = token.strip_prefix("env.") {
            return self
                .env
                .get(name.trim())
                .ok_or_else(|| self.missing(token));
        }
        if let Some(value) = resolve_builtin(token) {
            return Ok(value);
        }
        self.table
            .get(token)
            .map(str::to_string)
            .ok_or_else(|| self.missing(token))
    }

    fn missing(&self, token: &str) -> VarError {
        VarError::MissingVariable {
            token: token.to_string(),
            template: self.template.to_string(),
        }
    }
}

/// Rebuilds `value`, passing every string leaf through `f`.
pub fn map_strings<E, F>(value: &Value, f: &mut F) -> Result<Value, E>
where
    F: FnMut(&str) -> Result<String, E>,
{
    Ok(match value {
        Value::String(text) => Value::String(f(text)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| map_strings(item, f))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, item) in map {
                out.insert(key.clone(), map_strings(item, f)?);
            }
            Value::Object(out)
        }
        other => other.clone(),
    })
}
