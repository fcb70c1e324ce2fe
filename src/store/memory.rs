//! In-process backend for the session store
//!
//! Used by tests and as the fallback when the data directory is unusable.

use std::sync::Mutex;

use anyhow::{anyhow, Result};

use super::{SessionStore, StoreLimits, StoredState};
use crate::theme::Theme;
use crate::timer::SessionSnapshot;

#[derive(Debug, Default)]
struct MemoryData {
    state: StoredState,
    active_session: Option<SessionSnapshot>,
    theme: Theme,
}

/// Store that never touches the disk
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<MemoryData>,
    limits: StoreLimits,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: StoreLimits) -> Self {
        Self {
            data: Mutex::default(),
            limits,
        }
    }

    fn with_data<T>(&self, f: impl FnOnce(&mut MemoryData) -> T) -> Result<T> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        Ok(f(&mut data))
    }
}

impl SessionStore for MemoryStore {
    fn load_state(&self) -> Result<StoredState> {
        self.with_data(|data| data.state.clone())
    }

    fn save_state(&self, state: &StoredState) -> Result<()> {
        self.with_data(|data| data.state = state.clone())
    }

    fn active_session(&self) -> Result<Option<SessionSnapshot>> {
        self.with_data(|data| data.active_session.clone())
    }

    fn save_active_session(&self, snapshot: &SessionSnapshot) -> Result<()> {
        self.with_data(|data| data.active_session = Some(snapshot.clone()))
    }

    fn clear_active_session(&self) -> Result<()> {
        self.with_data(|data| data.active_session = None)
    }

    fn theme(&self) -> Result<Theme> {
        self.with_data(|data| data.theme)
    }

    fn save_theme(&self, theme: Theme) -> Result<()> {
        self.with_data(|data| data.theme = theme)
    }

    fn limits(&self) -> StoreLimits {
        self.limits
    }
}
