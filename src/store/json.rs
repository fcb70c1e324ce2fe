//! JSON file backend for the session store

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{SessionStore, StoreLimits, StoredState};
use crate::config::Config;
use crate::theme::Theme;
use crate::timer::SessionSnapshot;

const STATE_FILE: &str = "state.json";
const ACTIVE_SESSION_FILE: &str = "active_session.json";
const THEME_FILE: &str = "theme.json";

#[derive(Debug, Serialize, Deserialize)]
struct ThemeFile {
    theme: Theme,
}

/// Store that keeps each document in its own JSON file under a data directory
#[derive(Debug, Clone)]
pub struct JsonStore {
    state_path: PathBuf,
    active_session_path: PathBuf,
    theme_path: PathBuf,
    limits: StoreLimits,
}

impl JsonStore {
    /// Open (and create if needed) a store rooted at `data_dir`
    pub fn open(data_dir: impl Into<PathBuf>, limits: StoreLimits) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).with_context(|| {
            format!("Failed to create data directory {}", data_dir.display())
        })?;

        Ok(Self {
            state_path: data_dir.join(STATE_FILE),
            active_session_path: data_dir.join(ACTIVE_SESSION_FILE),
            theme_path: data_dir.join(THEME_FILE),
            limits,
        })
    }

    /// Open the store described by the application config
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(
            &config.data_dir,
            StoreLimits {
                history: config.history_limit,
                incomplete: config.incomplete_limit,
            },
        )
    }

    /// Path of the main state document
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Path of the active-session snapshot
    pub fn active_session_path(&self) -> &Path {
        &self.active_session_path
    }

    fn read_optional(path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(content))
    }

    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("tmp");
        let file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create {}", temp_path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).context("Failed to serialize data")?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        match fs::rename(&temp_path, path) {
            Ok(()) => Ok(()),
            Err(_) if path.exists() => {
                let _ = fs::remove_file(path);
                fs::rename(&temp_path, path)
                    .with_context(|| format!("Failed to replace {}", path.display()))
            }
            Err(e) => Err(e).with_context(|| format!("Failed to write {}", path.display())),
        }
    }
}

impl SessionStore for JsonStore {
    fn load_state(&self) -> Result<StoredState> {
        let Some(content) = Self::read_optional(&self.state_path)? else {
            return Ok(StoredState::default());
        };
        match serde_json::from_str(&content) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::error!(
                    "Failed to parse {}, starting from empty state: {}",
                    self.state_path.display(),
                    e
                );
                Ok(StoredState::default())
            }
        }
    }

    fn save_state(&self, state: &StoredState) -> Result<()> {
        Self::write_json(&self.state_path, state).context("Failed to save state")
    }

    fn active_session(&self) -> Result<Option<SessionSnapshot>> {
        let Some(content) = Self::read_optional(&self.active_session_path)? else {
            return Ok(None);
        };
        match serde_json::from_str(&content) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable active session snapshot: {}", e);
                Ok(None)
            }
        }
    }

    fn save_active_session(&self, snapshot: &SessionSnapshot) -> Result<()> {
        Self::write_json(&self.active_session_path, snapshot)
            .context("Failed to save active session")
    }

    fn clear_active_session(&self) -> Result<()> {
        match fs::remove_file(&self.active_session_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to clear active session"),
        }
    }

    fn theme(&self) -> Result<Theme> {
        let Some(content) = Self::read_optional(&self.theme_path)? else {
            return Ok(Theme::default());
        };
        Ok(serde_json::from_str::<ThemeFile>(&content)
            .map(|file| file.theme)
            .unwrap_or_default())
    }

    fn save_theme(&self, theme: Theme) -> Result<()> {
        Self::write_json(&self.theme_path, &ThemeFile { theme }).context("Failed to save theme")
    }

    fn limits(&self) -> StoreLimits {
        self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::HistoryEntry;
    use crate::task::{Category, Task};
    use crate::timer::Mode;
    use chrono::Utc;
    use tempfile::TempDir;

    fn test_store(temp_dir: &TempDir) -> JsonStore {
        JsonStore::open(temp_dir.path(), StoreLimits::default()).unwrap()
    }

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            task: Task::new("Write", Category::Work, 25, 5),
            mode: Mode::Break,
            focus_remaining_seconds: 1490,
            break_remaining_seconds: 250,
            running: true,
            paused: false,
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn test_load_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        assert_eq!(store.load_state().unwrap(), StoredState::default());
        assert!(store.active_session().unwrap().is_none());
        assert_eq!(store.theme().unwrap(), Theme::Light);
    }

    #[test]
    fn test_state_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let task = Task::new("Write", Category::Work, 25, 5);
        {
            let store = test_store(&temp_dir);
            store
                .append_history(HistoryEntry::new(&task, 25, true, Utc::now()))
                .unwrap();
            store.save_incomplete_task(&task, 600, Mode::Focus).unwrap();
        }

        let reopened = test_store(&temp_dir);
        assert_eq!(reopened.history().unwrap().len(), 1);
        assert_eq!(reopened.incomplete_tasks().unwrap().len(), 1);
        assert_eq!(reopened.stats().unwrap().total_sessions, 1);
    }

    #[test]
    fn test_corrupted_state_loads_default() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        fs::write(store.state_path(), "{ not json").unwrap();

        assert_eq!(store.load_state().unwrap(), StoredState::default());
    }

    #[test]
    fn test_active_session_roundtrip_and_take() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let saved = snapshot();

        store.save_active_session(&saved).unwrap();
        assert_eq!(store.active_session().unwrap(), Some(saved.clone()));

        assert_eq!(store.take_active_session().unwrap(), Some(saved));
        assert!(!store.active_session_path().exists());
        assert!(store.take_active_session().unwrap().is_none());
    }

    #[test]
    fn test_corrupted_snapshot_is_absent_and_cleared() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        fs::write(store.active_session_path(), "garbage").unwrap();

        assert!(store.take_active_session().unwrap().is_none());
        assert!(!store.active_session_path().exists());
    }

    #[test]
    fn test_theme_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        store.save_theme(Theme::Dark).unwrap();
        assert_eq!(test_store(&temp_dir).theme().unwrap(), Theme::Dark);
    }
}
