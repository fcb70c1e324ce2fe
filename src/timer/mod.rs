//! Focus/break timer
//!
//! This module provides:
//! - The timer state machine that drives a task through focus and break phases
//! - A cancellable one-second tick source the machine owns
//! - Snapshots used to recover a session after the process restarts
//! - A pure display projection for whatever renders the timer

pub mod clock;
pub mod display;
pub mod machine;
pub mod notify;
pub mod recorder;
pub mod ticker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use display::{format_clock, DisplayProjection};
pub use machine::{RestoreOutcome, TickOutcome, TimerError, TimerMachine, Transition};
pub use notify::{CompletionUi, Notifier};
pub use recorder::SessionRecorder;
pub use ticker::{IntervalTicker, ManualTicker, Tick, TickSource};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Which countdown is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Focus,
    Break,
}

impl Mode {
    /// Color token used to render this mode
    pub fn color_token(self) -> &'static str {
        match self {
            Mode::Focus => "#10b981",
            Mode::Break => "#3b82f6",
        }
    }
}

/// Lifecycle phase of the timer
///
/// There is no paused break: a break runs until it completes or is cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// No task loaded
    #[default]
    Idle,
    /// Task loaded, focus countdown not ticking
    FocusReady,
    /// Focus countdown ticking
    FocusRunning,
    /// Break countdown ticking
    BreakRunning,
}

impl Phase {
    /// A countdown is ticking
    pub fn is_running(self) -> bool {
        matches!(self, Phase::FocusRunning | Phase::BreakRunning)
    }

    /// A task is loaded but nothing is ticking
    pub fn is_paused(self) -> bool {
        matches!(self, Phase::FocusReady)
    }
}

/// The machine's single mutable state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerState {
    pub current_task: Option<Task>,
    pub mode: Mode,
    pub focus_remaining_seconds: u32,
    pub break_remaining_seconds: u32,
    pub phase: Phase,
}

impl TimerState {
    /// Fresh state for a newly loaded task: full counters, focus mode, not ticking
    pub fn loaded(task: Task) -> Self {
        Self {
            focus_remaining_seconds: task.work_seconds(),
            break_remaining_seconds: task.break_seconds(),
            current_task: Some(task),
            mode: Mode::Focus,
            phase: Phase::FocusReady,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.phase.is_paused()
    }

    /// Pure display projection of this state
    pub fn projection(&self) -> DisplayProjection {
        display::project(
            self.mode,
            self.focus_remaining_seconds,
            self.break_remaining_seconds,
            self.current_task.as_ref(),
        )
    }

    /// Snapshot of this state, or `None` when idle
    pub fn snapshot(&self, saved_at: DateTime<Utc>) -> Option<SessionSnapshot> {
        let task = self.current_task.clone()?;
        Some(SessionSnapshot {
            task,
            mode: self.mode,
            focus_remaining_seconds: self.focus_remaining_seconds,
            break_remaining_seconds: self.break_remaining_seconds,
            running: self.is_running(),
            paused: self.is_paused(),
            saved_at,
        })
    }
}

/// Persisted copy of the timer state used for crash recovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub task: Task,
    pub mode: Mode,
    pub focus_remaining_seconds: u32,
    pub break_remaining_seconds: u32,
    pub running: bool,
    pub paused: bool,
    pub saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Reject snapshots no reachable state could have produced
    pub fn validate(&self) -> Result<(), String> {
        self.task.validate()?;
        if self.running && self.paused {
            return Err("snapshot is both running and paused".to_string());
        }
        if self.focus_remaining_seconds > self.task.work_seconds() {
            return Err(format!(
                "focus remaining {}s exceeds work duration",
                self.focus_remaining_seconds
            ));
        }
        if self.break_remaining_seconds > self.task.break_seconds() {
            return Err(format!(
                "break remaining {}s exceeds break duration",
                self.break_remaining_seconds
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Category;

    #[test]
    fn test_loaded_state() {
        let state = TimerState::loaded(Task::new("Write", Category::Work, 25, 5));
        assert_eq!(state.focus_remaining_seconds, 1500);
        assert_eq!(state.break_remaining_seconds, 300);
        assert_eq!(state.phase, Phase::FocusReady);
        assert!(state.is_paused());
        assert!(!state.is_running());
    }

    #[test]
    fn test_idle_has_no_snapshot() {
        assert!(TimerState::default().snapshot(Utc::now()).is_none());
    }

    #[test]
    fn test_snapshot_validation() {
        let state = TimerState::loaded(Task::new("Write", Category::Work, 25, 5));
        let mut snapshot = state.snapshot(Utc::now()).unwrap();
        assert!(snapshot.validate().is_ok());

        snapshot.running = true;
        assert!(snapshot.validate().is_err());

        snapshot.paused = false;
        snapshot.focus_remaining_seconds = 1501;
        assert!(snapshot.validate().is_err());
    }
}
