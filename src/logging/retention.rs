//! Removal of log files past the configured retention

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};

use super::file_writer::LOG_FILE_PREFIX;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Whether a file name belongs to a log this crate wrote
fn is_log_file(name: &str) -> bool {
    name.starts_with(LOG_FILE_PREFIX) && name.ends_with(".log")
}

/// Delete our log files last modified more than `retention_days` ago
///
/// Files that are not ours, or whose age cannot be read, are left alone.
/// Returns the number of files deleted.
pub fn cleanup_old_logs(logs_dir: &Path, retention_days: u64) -> Result<usize> {
    if !logs_dir.exists() {
        return Ok(0);
    }

    let cutoff = SystemTime::now()
        .checked_sub(Duration::from_secs(retention_days.saturating_mul(SECS_PER_DAY)))
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let entries = fs::read_dir(logs_dir)
        .with_context(|| format!("Failed to read logs directory {}", logs_dir.display()))?;

    let mut deleted = 0;
    for entry in entries.flatten() {
        let ours = entry.file_name().to_str().is_some_and(is_log_file);
        if !ours {
            continue;
        }

        let expired = entry
            .metadata()
            .and_then(|m| m.modified())
            .is_ok_and(|modified| modified < cutoff);
        if expired {
            match fs::remove_file(entry.path()) {
                Ok(()) => deleted += 1,
                Err(e) => tracing::debug!("Could not remove {}: {}", entry.path().display(), e),
            }
        }
    }

    Ok(deleted)
}
