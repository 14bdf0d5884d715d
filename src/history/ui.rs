//! Listing of history entries for `--history`.

use super::models::HistoryEntry;
use chrono::{DateTime, Local, Utc};

/// One line per entry, numbered the way `--replay` expects.
pub fn format_history_list(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No request history.".to_string();
    }
    let mut lines = vec!["Request history:".to_string(), String::new()];
    lines.extend(
        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| format_history_entry(index, entry)),
    );
    lines.join("\n")
}

/// Format: `  [INDEX] METHOD LABEL  (timestamp)`, where the label is the
/// template name in brackets when there is one, the URL otherwise.
pub fn format_history_entry(index: usize, entry: &HistoryEntry) -> String {
    let label = match &entry.template {
        Some(template) => format!("[{}]", template),
        None => entry.url.clone(),
    };
    format!(
        "  [{}] {:<6} {}  ({})",
        index,
        entry.method.as_str(),
        label,
        format_timestamp(&entry.timestamp)
    )
}

/// Local time as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    let local_time: DateTime<Local> = timestamp.with_timezone(&Local);
    local_time.format("%Y-%m-%d %H:%M:%S").to_string()
}
