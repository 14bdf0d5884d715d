//! Response snapshots.
//!
//! A snapshot is a saved response used as a regression baseline. The
//! filesystem store keeps one pretty-printed JSON file per name:
//! `<snapshots_dir>/<name>.json` holding
//! `{status_code, headers, body, saved_at}`.

pub mod diff;

pub use diff::{compare_response, diff_values, values_equal, Change};

use crate::models::HttpResponse;
use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid snapshot name '{0}'")]
    InvalidName(String),

    #[error("snapshot '{name}' not found at {path}")]
    NotFound { name: String, path: PathBuf },

    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid snapshot {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A persisted response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub status_code: u16,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub body: Value,
    /// RFC 3339 timestamp of when the snapshot was taken.
    #[serde(default)]
    pub saved_at: String,
}

impl SnapshotRecord {
    /// Captures a response, stamped with the current time.
    pub fn from_response(response: &HttpResponse) -> Self {
        Self {
            status_code: response.status_code,
            headers: response.headers.clone(),
            body: response.body.clone(),
            saved_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Name and timestamp of a stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub name: String,
    /// `?` when the file could not be read.
    pub saved_at: String,
}

/// Persistence for named snapshots.
pub trait SnapshotStore {
    /// Saves `record` under `name`, replacing any previous snapshot, and
    /// returns where it was written.
    fn save(&self, name: &str, record: &SnapshotRecord) -> Result<PathBuf, SnapshotError>;

    /// Loads the snapshot called `name`.
    fn load(&self, name: &str) -> Result<SnapshotRecord, SnapshotError>;

    /// All stored snapshots, sorted by name.
    fn list(&self) -> Result<Vec<SnapshotSummary>, SnapshotError>;
}

/// Snapshots stored as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    dir: PathBuf,
}

impl FsSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file a snapshot name maps to.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::InvalidName` for empty names, `.`/`..` and
    /// names containing path separators.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, SnapshotError> {
        let invalid = name.trim().is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\']);
        if invalid {
            return Err(SnapshotError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", name)))
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn save(&self, name: &str, record: &SnapshotRecord) -> Result<PathBuf, SnapshotError> {
        let path = self.path_for(name)?;
        let io_error = |source| SnapshotError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_error)?;
        let json = serde_json::to_string_pretty(record).map_err(|source| SnapshotError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json + "\n").map_err(io_error)?;
        debug!("saved snapshot '{}' to {}", name, path.display());
        Ok(path)
    }

    fn load(&self, name: &str) -> Result<SnapshotRecord, SnapshotError> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(SnapshotError::NotFound {
                name: name.to_string(),
                path,
            });
        }
        let text = fs::read_to_string(&path).map_err(|source| SnapshotError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SnapshotError::Json { path, source })
    }

    fn list(&self) -> Result<Vec<SnapshotSummary>, SnapshotError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|source| SnapshotError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut summaries: Vec<SnapshotSummary> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "json"))
            .filter_map(|path| {
                let name = path.file_stem()?.to_string_lossy().into_owned();
                let saved_at = fs::read_to_string(&path)
                    .ok()
                    .and_then(|text| serde_json::from_str::<SnapshotRecord>(&text).ok())
                    .map(|record| record.saved_at)
                    .unwrap_or_else(|| "?".to_string());
                Some(SnapshotSummary { name, saved_at })
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }
}
