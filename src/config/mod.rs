//! Configuration discovery and loading.
//!
//! The config file is looked up in this order:
//!
//! 1. the path given with `-c` (no fallthrough if it does not exist)
//! 2. `.reqcap.yaml`, `.reqcap.yml`, `reqcap.yaml`, `reqcap.yml` in the
//!    working directory
//! 3. `~/.reqcap/config.yaml`
//!
//! Finding nothing is not an error; every setting has a default. Paths inside
//! the config resolve relative to the file's own directory.

pub mod schema;

pub use schema::{Defaults, FilterConfig, FilterOverride, ReqcapConfig, DEFAULT_TIMEOUT_SECS};

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file names searched in the working directory.
pub const CWD_CONFIG_CANDIDATES: &[&str] = &[".reqcap.yaml", ".reqcap.yml", "reqcap.yaml", "reqcap.yml"];

/// Name of the per-user directory under `$HOME`.
pub const GLOBAL_DIR_NAME: &str = ".reqcap";

/// Errors raised while locating or reading the config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A setting is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Returns `~/.reqcap`, or `None` when no home directory is known.
pub fn global_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join(GLOBAL_DIR_NAME))
}

/// A loaded config together with where it came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: ReqcapConfig,
    /// The file the config was read from; `None` when defaults are used.
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// Defaults with no backing file.
    pub fn defaults() -> Self {
        Self::default()
    }

    /// Finds and loads the config, starting the search in `cwd`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if `explicit` is given but missing, and
    /// read, parse or validation errors for the selected file.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        match find_config_file(explicit, cwd, global_dir().as_deref())? {
            Some(path) => Self::load(&path),
            None => {
                debug!("no config file found, using defaults");
                Ok(Self::defaults())
            }
        }
    }

    /// Loads and validates a specific config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ReqcapConfig::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!("loaded config from {}", path.display());
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(Self {
            config,
            path: Some(path),
        })
    }

    pub fn defaults_section(&self) -> &Defaults {
        &self.config.defaults
    }

    /// Directory containing the config file.
    pub fn config_dir(&self) -> Option<&Path> {
        self.path.as_deref().and_then(Path::parent)
    }

    /// Resolves a path from the config relative to the config file.
    pub fn relative_to_config(&self, value: &str) -> PathBuf {
        let path = PathBuf::from(value);
        match self.config_dir() {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }

    /// The `.env` file to overlay, if the config names one.
    pub fn env_file(&self) -> Option<PathBuf> {
        self.config
            .defaults
            .env_file
            .as_deref()
            .map(|value| self.relative_to_config(value))
    }

    /// Candidate directories for a named resource (`templates`, `snapshots`)
    /// in lookup order.
    ///
    /// A command-line override is the only candidate when given. Otherwise:
    /// the `<resource>_dir` config setting, `./<resource>` and
    /// `~/.reqcap/<resource>`.
    pub fn resource_candidates(
        &self,
        resource: &str,
        cli_override: Option<&Path>,
        cwd: &Path,
    ) -> Vec<PathBuf> {
        if let Some(path) = cli_override {
            return vec![cwd.join(path)];
        }

        let mut candidates = Vec::new();
        let configured = match resource {
            "templates" => self.config.defaults.templates_dir.as_deref(),
            "snapshots" => self.config.defaults.snapshots_dir.as_deref(),
            _ => None,
        };
        if let Some(value) = configured {
            candidates.push(self.relative_to_config(value));
        }
        candidates.push(cwd.join(resource));
        if let Some(global) = global_dir() {
            candidates.push(global.join(resource));
        }
        candidates
    }

    /// The first existing resource directory, if any.
    pub fn resolve_resource_dir(
        &self,
        resource: &str,
        cli_override: Option<&Path>,
        cwd: &Path,
    ) -> Option<PathBuf> {
        self.resource_candidates(resource, cli_override, cwd)
            .into_iter()
            .find(|p| p.exists())
    }

    /// Directory to write a resource into.
    ///
    /// Same lookup as [`resolve_resource_dir`](Self::resolve_resource_dir);
    /// when nothing exists yet this falls back to the configured directory,
    /// else `./<resource>`.
    pub fn resource_dir_for_write(
        &self,
        resource: &str,
        cli_override: Option<&Path>,
        cwd: &Path,
    ) -> PathBuf {
        let candidates = self.resource_candidates(resource, cli_override, cwd);
        if let Some(existing) = candidates.iter().find(|p| p.exists()) {
            return existing.clone();
        }
        match candidates.into_iter().next() {
            Some(first) if cli_override.is_some() || self.has_configured_dir(resource) => first,
            _ => cwd.join(resource),
        }
    }

    fn has_configured_dir(&self, resource: &str) -> bool {
        match resource {
            "templates" => self.config.defaults.templates_dir.is_some(),
            "snapshots" => self.config.defaults.snapshots_dir.is_some(),
            _ => false,
        }
    }
}

/// Picks the config file to load.
fn find_config_file(
    explicit: Option<&Path>,
    cwd: &Path,
    global: Option<&Path>,
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        let path = cwd.join(path);
        return if path.is_file() {
            Ok(Some(path))
        } else {
            Err(ConfigError::NotFound(path))
        };
    }

    let global_config = global.map(|dir| dir.join("config.yaml"));
    Ok(CWD_CONFIG_CANDIDATES
        .iter()
        .map(|name| cwd.join(name))
        .chain(global_config)
        .find(|p| p.is_file()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let result = find_config_file(Some(Path::new("missing.yaml")), dir.path(), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_cwd_candidates_in_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("reqcap.yml"), "defaults: {}").unwrap();
        fs::write(dir.path().join(".reqcap.yml"), "defaults: {}").unwrap();

        let found = find_config_file(None, dir.path(), None).unwrap();
        assert_eq!(found, Some(dir.path().join(".reqcap.yml")));
    }

    #[test]
    fn test_global_config_is_last_resort() {
        let cwd = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        fs::write(global.path().join("config.yaml"), "defaults: {}").unwrap();

        let found = find_config_file(None, cwd.path(), Some(global.path())).unwrap();
        assert_eq!(found, Some(global.path().join("config.yaml")));

        let none = find_config_file(None, cwd.path(), None).unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn test_load_resolves_paths_relative_to_config() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("project");
        fs::create_dir_all(nested.join("api-templates")).unwrap();
        let config_path = nested.join(".reqcap.yaml");
        fs::write(
            &config_path,
            "defaults:\n  templates_dir: api-templates\n  env_file: .env\n",
        )
        .unwrap();

        let loaded = LoadedConfig::load(&config_path).unwrap();
        let config_dir = loaded.config_dir().unwrap().to_path_buf();
        assert_eq!(loaded.env_file(), Some(config_dir.join(".env")));

        let resolved = loaded
            .resolve_resource_dir("templates", None, dir.path())
            .unwrap();
        assert_eq!(resolved, config_dir.join("api-templates"));
    }

    #[test]
    fn test_cli_override_is_hard() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("templates")).unwrap();
        let loaded = LoadedConfig::defaults();

        let candidates =
            loaded.resource_candidates("templates", Some(Path::new("elsewhere")), dir.path());
        assert_eq!(candidates, vec![dir.path().join("elsewhere")]);
        assert_eq!(
            loaded.resolve_resource_dir("templates", Some(Path::new("elsewhere")), dir.path()),
            None
        );
    }

    #[test]
    fn test_cwd_resource_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("snapshots")).unwrap();
        let loaded = LoadedConfig::defaults();
        assert_eq!(
            loaded.resolve_resource_dir("snapshots", None, dir.path()),
            Some(dir.path().join("snapshots"))
        );
    }

    #[test]
    fn test_write_dir_defaults_to_cwd() {
        let dir = TempDir::new().unwrap();
        let loaded = LoadedConfig::defaults();
        let target = loaded.resource_dir_for_write("snapshots", None, dir.path());
        // ~/.reqcap/snapshots may exist on the machine running the tests
        assert!(target == dir.path().join("snapshots") || target.ends_with(".reqcap/snapshots"));
    }

    #[test]
    fn test_write_dir_uses_configured_dir_before_it_exists() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(".reqcap.yaml");
        fs::write(&config_path, "defaults:\n  snapshots_dir: baselines\n").unwrap();
        let loaded = LoadedConfig::load(&config_path).unwrap();
        let target = loaded.resource_dir_for_write("snapshots", None, dir.path());
        let configured = loaded.config_dir().unwrap().join("baselines");
        assert!(target == configured || target.ends_with(".reqcap/snapshots"));
    }

    #[test]
    fn test_invalid_yaml_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".reqcap.yaml");
        fs::write(&path, "defaults: [unclosed").unwrap();
        let err = LoadedConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains(".reqcap.yaml"));
    }
}
