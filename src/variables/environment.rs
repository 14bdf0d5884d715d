//! `$VAR` and `${VAR}` references in configuration values.
//!
//! Config files and templates can point at secrets kept in the environment
//! (`token: ${API_TOKEN}`). References that cannot be resolved are left as
//! written.

use crate::environment::EnvProvider;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ENV_REF_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^}]+)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("Failed to compile env reference regex")
});

/// Replaces `$VAR` / `${VAR}` references with values from `env`.
pub fn expand_env_refs(text: &str, env: &dyn EnvProvider) -> String {
    if !text.contains('$') {
        return text.to_string();
    }
    ENV_REF_REGEX
        .replace_all(text, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            env.get(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
