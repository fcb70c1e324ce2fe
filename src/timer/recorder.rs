//! Turns terminating timer transitions into store writes

use std::sync::Arc;

use anyhow::Result;

use crate::store::{HistoryEntry, IncompleteTaskRecord, SessionStore};
use crate::task::Task;

use super::{Clock, Mode};

/// Writes completed and interrupted sessions to the store
#[derive(Clone)]
pub struct SessionRecorder {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl SessionRecorder {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Append a completed history entry; stats are updated in the same write
    pub fn record_completion(&self, task: &Task, duration_minutes: u32) -> Result<HistoryEntry> {
        let entry = HistoryEntry::new(task, duration_minutes, true, self.clock.now());
        self.store.append_history(entry.clone())?;
        tracing::info!(
            "Recorded completed session '{}' ({} min)",
            task.name,
            duration_minutes
        );
        Ok(entry)
    }

    /// Save a stopped focus session so it can be resumed later
    pub fn record_interruption(
        &self,
        task: &Task,
        focus_remaining_seconds: u32,
    ) -> Result<IncompleteTaskRecord> {
        let record =
            IncompleteTaskRecord::new(task, focus_remaining_seconds, Mode::Focus, self.clock.now());
        self.store.upsert_incomplete_task(record.clone())?;
        tracing::info!(
            "Saved incomplete task '{}' ({}s spent)",
            task.name,
            record.total_time_spent_seconds
        );
        Ok(record)
    }
}
