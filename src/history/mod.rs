//! Request history.
//!
//! Every request a run sends as its root step is recorded so it can be
//! listed with `--history` and sent again with `--replay N`. Entries are
//! kept in `~/.reqcap/history.jsonl`, newest first when listed, without
//! authentication or cookie headers.
//!
//! Failing to write history never fails the run that produced it.

pub mod models;
pub mod storage;
pub mod ui;

pub use models::{is_sensitive, HistoryEntry, HistoryError, SENSITIVE_HEADERS};
pub use storage::{HistoryStore, HISTORY_FILE_NAME, MAX_HISTORY_ENTRIES};
pub use ui::{format_history_entry, format_history_list, format_timestamp};
