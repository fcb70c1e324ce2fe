//! Durable storage for focus history and timer recovery
//!
//! The store keeps four things: the history log, the list of incomplete tasks,
//! user preferences with aggregate stats, and at most one active-session
//! snapshot used to survive restarts. Backends only implement the raw
//! load/save primitives; list policies (caps, upserts, stats) live in the
//! provided methods of [`SessionStore`] so every backend behaves the same.

mod json;
mod memory;

pub use json::JsonStore;
pub use memory::MemoryStore;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::{Category, Task};
use crate::theme::Theme;
use crate::timer::{Mode, SessionSnapshot};

/// Version tag written into exported data
pub const EXPORT_VERSION: &str = "1.0";

/// A finished (or abandoned) focus session in the history log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub task_name: String,
    pub category: Category,
    pub duration_minutes: u32,
    pub work_duration_minutes: u32,
    pub break_duration_minutes: u32,
    pub completed_at: DateTime<Utc>,
    pub completed: bool,
}

impl HistoryEntry {
    /// Build a history entry for a task
    pub fn new(task: &Task, duration_minutes: u32, completed: bool, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_name: task.name.clone(),
            category: task.category,
            duration_minutes,
            work_duration_minutes: task.work_duration_minutes,
            break_duration_minutes: task.break_duration_minutes,
            completed_at: at,
            completed,
        }
    }
}

/// A focus session stopped early with enough progress to resume later
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncompleteTaskRecord {
    pub id: Uuid,
    pub task: Task,
    pub focus_remaining_seconds: u32,
    pub mode: Mode,
    pub saved_at: DateTime<Utc>,
    pub total_time_spent_seconds: u32,
}

impl IncompleteTaskRecord {
    /// Build a record; time spent is derived from the task's work duration
    pub fn new(task: &Task, focus_remaining_seconds: u32, mode: Mode, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task: task.clone(),
            focus_remaining_seconds,
            mode,
            saved_at: at,
            total_time_spent_seconds: task.work_seconds().saturating_sub(focus_remaining_seconds),
        }
    }
}

/// User preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_work_duration")]
    pub default_work_duration: u32,
    #[serde(default = "default_break_duration")]
    pub default_break_duration: u32,
    #[serde(default = "default_sound_enabled")]
    pub sound_enabled: bool,
}

fn default_work_duration() -> u32 {
    25
}

fn default_break_duration() -> u32 {
    5
}

fn default_sound_enabled() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_work_duration: default_work_duration(),
            default_break_duration: default_break_duration(),
            sound_enabled: default_sound_enabled(),
        }
    }
}

/// Aggregate counters updated together with each completed history entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default)]
    pub total_sessions: u32,
    #[serde(default)]
    pub total_focus_minutes: u32,
}

/// Everything persisted in the main state document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredState {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub incomplete_tasks: Vec<IncompleteTaskRecord>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub stats: Stats,
}

impl StoredState {
    /// Insert at the head of the history, evicting the oldest past `limit`
    fn push_history(&mut self, entry: HistoryEntry, limit: usize) {
        if entry.completed {
            self.stats.total_sessions = self.stats.total_sessions.saturating_add(1);
            self.stats.total_focus_minutes = self
                .stats
                .total_focus_minutes
                .saturating_add(entry.duration_minutes);
        }
        self.history.insert(0, entry);
        self.history.truncate(limit);
    }

    /// Replace any record with the same task name, insert at the head
    fn upsert_incomplete(&mut self, record: IncompleteTaskRecord, limit: usize) {
        self.incomplete_tasks
            .retain(|existing| existing.task.name != record.task.name);
        self.incomplete_tasks.insert(0, record);
        self.incomplete_tasks.truncate(limit);
    }
}

/// Caps applied to the bounded lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub history: usize,
    pub incomplete: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            history: 100,
            incomplete: 10,
        }
    }
}

/// Persistent key-value store consumed by the timer core
pub trait SessionStore: Send + Sync {
    /// Load the main state document
    fn load_state(&self) -> Result<StoredState>;

    /// Replace the main state document
    fn save_state(&self, state: &StoredState) -> Result<()>;

    /// Read the active-session snapshot; unreadable snapshots read as `None`
    fn active_session(&self) -> Result<Option<SessionSnapshot>>;

    /// Write the active-session snapshot (last write wins)
    fn save_active_session(&self, snapshot: &SessionSnapshot) -> Result<()>;

    /// Remove the active-session snapshot
    fn clear_active_session(&self) -> Result<()>;

    /// Current theme
    fn theme(&self) -> Result<Theme>;

    /// Persist the theme
    fn save_theme(&self, theme: Theme) -> Result<()>;

    /// Caps for history and incomplete-task lists
    fn limits(&self) -> StoreLimits;

    fn history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.load_state()?.history)
    }

    /// Append an entry and update stats in a single write
    fn append_history(&self, entry: HistoryEntry) -> Result<()> {
        let mut state = self.load_state()?;
        state.push_history(entry, self.limits().history);
        self.save_state(&state)
    }

    fn incomplete_tasks(&self) -> Result<Vec<IncompleteTaskRecord>> {
        Ok(self.load_state()?.incomplete_tasks)
    }

    /// Insert a record, replacing any previous record for the same task name
    fn upsert_incomplete_task(&self, record: IncompleteTaskRecord) -> Result<()> {
        let mut state = self.load_state()?;
        state.upsert_incomplete(record, self.limits().incomplete);
        self.save_state(&state)
    }

    /// Convenience form of [`SessionStore::upsert_incomplete_task`] stamped with the current time
    fn save_incomplete_task(
        &self,
        task: &Task,
        focus_remaining_seconds: u32,
        mode: Mode,
    ) -> Result<IncompleteTaskRecord> {
        let record = IncompleteTaskRecord::new(task, focus_remaining_seconds, mode, Utc::now());
        self.upsert_incomplete_task(record.clone())?;
        Ok(record)
    }

    /// Remove an incomplete task; returns whether a record was removed
    fn remove_incomplete_task(&self, id: Uuid) -> Result<bool> {
        let mut state = self.load_state()?;
        let before = state.incomplete_tasks.len();
        state.incomplete_tasks.retain(|record| record.id != id);
        let removed = state.incomplete_tasks.len() != before;
        if removed {
            self.save_state(&state)?;
        }
        Ok(removed)
    }

    fn preferences(&self) -> Result<Preferences> {
        Ok(self.load_state()?.preferences)
    }

    fn update_preferences(&self, preferences: Preferences) -> Result<()> {
        let mut state = self.load_state()?;
        state.preferences = preferences;
        self.save_state(&state)
    }

    fn stats(&self) -> Result<Stats> {
        Ok(self.load_state()?.stats)
    }

    /// Read the active session and remove it in one step
    ///
    /// The slot is cleared even when the snapshot could not be read; a failed
    /// clear is logged and does not hide the snapshot from the caller.
    fn take_active_session(&self) -> Result<Option<SessionSnapshot>> {
        let snapshot = self.active_session();
        if let Err(e) = self.clear_active_session() {
            tracing::warn!("Failed to clear active session after reading it: {:#}", e);
        }
        snapshot
    }

    /// Drop all state and the active session; the theme is kept
    fn reset_all(&self) -> Result<()> {
        self.save_state(&StoredState::default())?;
        self.clear_active_session()
    }

    /// Export the state document for backup
    fn export_data(&self) -> Result<serde_json::Value> {
        let state = self.load_state()?;
        let mut value = serde_json::to_value(state).context("Failed to serialize state")?;
        if let Some(object) = value.as_object_mut() {
            object.insert(
                "exportedAt".to_string(),
                serde_json::Value::String(Utc::now().to_rfc3339()),
            );
            object.insert(
                "version".to_string(),
                serde_json::Value::String(EXPORT_VERSION.to_string()),
            );
        }
        Ok(value)
    }

    /// Merge an exported document over the current state
    fn import_data(&self, data: &serde_json::Value) -> Result<()> {
        let Some(incoming) = data.as_object() else {
            bail!("Invalid data format: expected a JSON object");
        };

        let current = self.load_state()?;
        let mut merged = serde_json::to_value(current).context("Failed to serialize state")?;
        if let Some(object) = merged.as_object_mut() {
            for (key, value) in incoming {
                object.insert(key.clone(), value.clone());
            }
        }

        let state: StoredState =
            serde_json::from_value(merged).context("Failed to parse imported data")?;
        self.save_state(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str) -> Task {
        Task::new(name, Category::Work, 25, 5)
    }

    #[test]
    fn test_append_history_updates_stats() {
        let store = MemoryStore::new();
        store
            .append_history(HistoryEntry::new(&task("Write"), 25, true, Utc::now()))
            .unwrap();
        store
            .append_history(HistoryEntry::new(&task("Read"), 30, true, Utc::now()))
            .unwrap();

        let history = store.history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].task_name, "Read");

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_focus_minutes, 55);
    }

    #[test]
    fn test_uncompleted_history_does_not_count() {
        let store = MemoryStore::new();
        store
            .append_history(HistoryEntry::new(&task("Write"), 25, false, Utc::now()))
            .unwrap();
        assert_eq!(store.stats().unwrap().total_sessions, 0);
        assert_eq!(store.history().unwrap().len(), 1);
    }

    #[test]
    fn test_history_is_capped() {
        let store = MemoryStore::with_limits(StoreLimits {
            history: 3,
            incomplete: 10,
        });
        for i in 0..5 {
            store
                .append_history(HistoryEntry::new(
                    &task(&format!("task {}", i)),
                    25,
                    true,
                    Utc::now(),
                ))
                .unwrap();
        }

        let history = store.history().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].task_name, "task 4");
        assert_eq!(history[2].task_name, "task 2");
        assert_eq!(store.stats().unwrap().total_sessions, 5);
    }

    #[test]
    fn test_incomplete_upsert_by_name() {
        let store = MemoryStore::new();
        store
            .save_incomplete_task(&task("Write"), 1200, Mode::Focus)
            .unwrap();
        store
            .save_incomplete_task(&task("Read"), 1000, Mode::Focus)
            .unwrap();
        let latest = store
            .save_incomplete_task(&task("Write"), 600, Mode::Focus)
            .unwrap();

        let records = store.incomplete_tasks().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, latest.id);
        assert_eq!(records[0].focus_remaining_seconds, 600);
        assert_eq!(records[0].total_time_spent_seconds, 900);
    }

    #[test]
    fn test_incomplete_is_capped() {
        let store = MemoryStore::with_limits(StoreLimits {
            history: 100,
            incomplete: 2,
        });
        for name in ["a", "b", "c"] {
            store.save_incomplete_task(&task(name), 600, Mode::Focus).unwrap();
        }
        let names: Vec<_> = store
            .incomplete_tasks()
            .unwrap()
            .into_iter()
            .map(|r| r.task.name)
            .collect();
        assert_eq!(names, vec!["c", "b"]);
    }

    #[test]
    fn test_remove_incomplete_task() {
        let store = MemoryStore::new();
        let record = store
            .save_incomplete_task(&task("Write"), 600, Mode::Focus)
            .unwrap();

        assert!(store.remove_incomplete_task(record.id).unwrap());
        assert!(!store.remove_incomplete_task(record.id).unwrap());
        assert!(store.incomplete_tasks().unwrap().is_empty());
    }

    #[test]
    fn test_reset_keeps_theme() {
        let store = MemoryStore::new();
        store.save_theme(Theme::Dark).unwrap();
        store
            .append_history(HistoryEntry::new(&task("Write"), 25, true, Utc::now()))
            .unwrap();

        store.reset_all().unwrap();

        assert!(store.history().unwrap().is_empty());
        assert_eq!(store.stats().unwrap(), Stats::default());
        assert_eq!(store.theme().unwrap(), Theme::Dark);
    }

    #[test]
    fn test_export_and_import() {
        let source = MemoryStore::new();
        source
            .append_history(HistoryEntry::new(&task("Write"), 25, true, Utc::now()))
            .unwrap();
        let exported = source.export_data().unwrap();
        assert_eq!(exported["version"], EXPORT_VERSION);
        assert!(exported.get("exportedAt").is_some());

        let target = MemoryStore::new();
        let mut prefs = Preferences::default();
        prefs.default_work_duration = 40;
        target.update_preferences(prefs.clone()).unwrap();

        target.import_data(&exported).unwrap();
        assert_eq!(target.history().unwrap().len(), 1);
        assert_eq!(target.stats().unwrap().total_sessions, 1);
        // The export carries its own preferences, which win the merge
        assert_eq!(target.preferences().unwrap(), Preferences::default());
    }

    #[test]
    fn test_import_rejects_non_object() {
        let store = MemoryStore::new();
        assert!(store.import_data(&serde_json::json!([1, 2, 3])).is_err());
    }
}
