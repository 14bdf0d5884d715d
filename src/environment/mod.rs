//! Environment variable access.
//!
//! Placeholders such as `{{env.API_TOKEN}}` and `$API_TOKEN` references in
//! configuration read through an [`EnvProvider`]. The process implementation
//! overlays values from a `.env` file on top of the real environment.

use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a `.env` file.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The file exists but could not be read or parsed.
    #[error("failed to load env file {path}: {source}")]
    Dotenv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// Source of environment variables.
pub trait EnvProvider {
    /// Returns the value of `name`, or `None` when it is not set.
    fn get(&self, name: &str) -> Option<String>;
}

/// The process environment, optionally overlaid with `.env` values.
///
/// Values from the `.env` file take precedence over the process environment.
#[derive(Debug, Clone, Default)]
pub struct ProcessEnv {
    overlay: HashMap<String, String>,
}

impl ProcessEnv {
    /// Process environment without an overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `env_file` as an overlay. A missing file yields an empty overlay.
    ///
    /// # Errors
    ///
    /// Returns `EnvError::Dotenv` when the file exists but is malformed.
    pub fn with_env_file(env_file: &Path) -> Result<Self, EnvError> {
        if !env_file.is_file() {
            debug!("env file {} not found, skipping", env_file.display());
            return Ok(Self::new());
        }

        let to_error = |source| EnvError::Dotenv {
            path: env_file.to_path_buf(),
            source,
        };
        let mut overlay = HashMap::new();
        for item in dotenvy::from_path_iter(env_file).map_err(to_error)? {
            let (key, value) = item.map_err(to_error)?;
            overlay.insert(key, value);
        }
        debug!(
            "loaded {} variables from {}",
            overlay.len(),
            env_file.display()
        );
        Ok(Self { overlay })
    }
}

impl EnvProvider for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.overlay
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }
}

impl EnvProvider for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}
