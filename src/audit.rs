use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Utc;

use crate::CommandLogEntry;

/// Append one line to the daily command log. Best-effort: callers log the
/// error and carry on, a failed audit write never fails the request.
pub(crate) fn append_command_log(
    log_dir: &Path,
    entry: &CommandLogEntry,
) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(log_dir)?;
    let date_str = Utc::now().format("%Y-%m-%d");
    let path = log_dir.join(format!("commands-{date_str}.jsonl"));
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{}", json)?;
    Ok(())
}

pub(crate) fn log_entry(user: &str, status: &str, called_tool: Option<&str>, message: &str) -> CommandLogEntry {
    CommandLogEntry {
        ts: Utc::now().to_rfc3339(),
        user: user.to_string(),
        status: status.to_string(),
        called_tool: called_tool.map(|s| s.to_string()),
        message: message.to_string(),
    }
}
