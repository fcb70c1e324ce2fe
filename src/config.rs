//! Configuration management for focusflow

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::store::Preferences;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding persisted state (history, incomplete tasks, active session)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Work duration in minutes for quick-start tasks (default: 25)
    #[serde(default = "default_work_minutes")]
    pub default_work_minutes: u32,

    /// Break duration in minutes for quick-start tasks (default: 5)
    #[serde(default = "default_break_minutes")]
    pub default_break_minutes: u32,

    /// Maximum number of history entries kept (default: 100)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Maximum number of incomplete tasks kept (default: 10)
    #[serde(default = "default_incomplete_limit")]
    pub incomplete_limit: usize,

    /// Focus seconds that must elapse before a stopped task is kept for later (default: 60)
    #[serde(default = "default_incomplete_threshold")]
    pub incomplete_threshold_secs: u32,

    /// Whether toast notifications are printed by the host
    #[serde(default = "default_notifications_enabled")]
    pub notifications_enabled: bool,

    /// Log file retention in days (default: 7)
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u64,
}

fn default_data_dir() -> PathBuf {
    config_dir().join("data")
}

fn default_work_minutes() -> u32 {
    25 // Pomodoro-style default
}

fn default_break_minutes() -> u32 {
    5
}

fn default_history_limit() -> usize {
    100
}

fn default_incomplete_limit() -> usize {
    10
}

fn default_incomplete_threshold() -> u32 {
    60
}

fn default_notifications_enabled() -> bool {
    true
}

fn default_log_retention_days() -> u64 {
    7
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_work_minutes: default_work_minutes(),
            default_break_minutes: default_break_minutes(),
            history_limit: default_history_limit(),
            incomplete_limit: default_incomplete_limit(),
            incomplete_threshold_secs: default_incomplete_threshold(),
            notifications_enabled: default_notifications_enabled(),
            log_retention_days: default_log_retention_days(),
        }
    }
}

impl Config {
    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = config_file_path();
        if path.exists() {
            let content = std::fs::read_to_string(&path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Preferences seeded into a fresh store
    pub fn default_preferences(&self) -> Preferences {
        Preferences {
            default_work_duration: self.default_work_minutes,
            default_break_duration: self.default_break_minutes,
            ..Preferences::default()
        }
    }
}

/// Get the base configuration directory (~/.focusflow)
/// Falls back to ./.focusflow if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for config");
        PathBuf::from(".focusflow")
    })
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".focusflow"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the path to the logs directory
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}

/// Ensure the config and logs directories exist
///
/// The data directory is left to the store, which runs in memory when it
/// cannot be created.
pub fn ensure_directories() -> Result<()> {
    std::fs::create_dir_all(config_dir()).context("Failed to create config directory")?;

    std::fs::create_dir_all(logs_dir()).context("Failed to create logs directory")?;

    Ok(())
}
