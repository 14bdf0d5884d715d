//! Persistent storage for request history.
//!
//! Entries are kept as JSON lines, oldest first, so recording a request is
//! an append. Once the file holds more than [`MAX_HISTORY_ENTRIES`] lines it
//! is rewritten with only the most recent ones.

use super::models::{HistoryEntry, HistoryError};
use crate::config::global_dir;
use log::{debug, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Maximum number of entries to retain.
pub const MAX_HISTORY_ENTRIES: usize = 50;

pub const HISTORY_FILE_NAME: &str = "history.jsonl";

/// History file on disk.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    max_entries: usize,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_entries: MAX_HISTORY_ENTRIES,
        }
    }

    /// The store at `~/.reqcap/history.jsonl`.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::NoHomeDir` when no home directory is known.
    pub fn open_default() -> Result<Self, HistoryError> {
        let dir = global_dir().ok_or(HistoryError::NoHomeDir)?;
        Ok(Self::new(dir.join(HISTORY_FILE_NAME)))
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends an entry, then trims the file to the entry limit.
    pub fn record(&self, entry: &HistoryEntry) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        drop(file);

        self.maintain_limit()?;
        Ok(())
    }

    /// Records an entry, logging instead of failing.
    pub fn record_quietly(&self, entry: &HistoryEntry) {
        if let Err(e) = self.record(entry) {
            warn!("could not write history to {}: {}", self.path.display(), e);
        }
    }

    /// All entries, newest first.
    ///
    /// A missing file is an empty history; lines that fail to parse are
    /// skipped.
    pub fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut entries = self.load_oldest_first()?;
        entries.reverse();
        Ok(entries)
    }

    /// Entry `index` of [`load`](Self::load).
    pub fn get(&self, index: usize) -> Result<HistoryEntry, HistoryError> {
        let mut entries = self.load()?;
        let count = entries.len();
        if index >= count {
            return Err(HistoryError::InvalidIndex { index, count });
        }
        Ok(entries.swap_remove(index))
    }

    fn load_oldest_first(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(
                    "skipping corrupted history entry at line {}: {}",
                    line_num + 1,
                    e
                ),
            }
        }
        Ok(entries)
    }

    /// Rewrites the file keeping the most recent entries. Returns how many
    /// were removed.
    fn maintain_limit(&self) -> Result<usize, HistoryError> {
        let entries = self.load_oldest_first()?;
        if entries.len() <= self.max_entries {
            return Ok(0);
        }
        let removed = entries.len() - self.max_entries;

        let temp_path = self.path.with_extension("jsonl.tmp");
        let mut temp_file = File::create(&temp_path)?;
        for entry in &entries[removed..] {
            writeln!(temp_file, "{}", serde_json::to_string(entry)?)?;
        }
        temp_file.flush()?;
        drop(temp_file);
        fs::rename(&temp_path, &self.path)?;

        debug!("trimmed {} old history entries", removed);
        Ok(removed)
    }
}
