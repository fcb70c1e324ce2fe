//! Timer session state machine
//!
//! The machine owns the only [`TimerState`] and the only [`TickSource`].
//! Every operation runs to completion on the caller's task; the host feeds
//! ticks back in through [`TimerMachine::tick`].
//!
//! Snapshots are written whenever the phase changes, not on every tick. A
//! running snapshot carries the remaining time at `saved_at`, which is all
//! restore needs to fast-forward.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::store::{HistoryEntry, IncompleteTaskRecord, SessionStore};
use crate::task::Task;

use super::{
    Clock, CompletionUi, DisplayProjection, Mode, Notifier, Phase, SessionRecorder,
    SessionSnapshot, SystemClock, TickSource, TimerState,
};

/// Focus time that must pass before a stopped task is kept for later
pub const DEFAULT_INCOMPLETE_THRESHOLD_SECS: u32 = 60;

/// Operations the current state does not allow, or inputs it rejects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("no task is loaded")]
    NoActiveTask,

    #[error("a task is already loaded")]
    NotIdle,

    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("incomplete task {0} was already resumed or removed")]
    UnknownRecord(Uuid),
}

/// What a successful user operation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A task was loaded and is waiting to start
    TaskLoaded,
    /// The focus countdown started
    FocusStarted,
    /// Focus was paused and the break countdown started
    BreakStarted,
    /// The break was abandoned and focus is waiting to resume
    BreakCancelled,
    /// The task was unloaded; `saved` holds the record kept for later
    Stopped { saved: Option<IncompleteTaskRecord> },
}

/// Result of delivering one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick belonged to a cancelled source or nothing was running
    Ignored,
    /// The active countdown moved on
    Counting { remaining_seconds: u32 },
    /// Focus reached zero; `entry` is `None` when it could not be stored
    FocusCompleted { entry: Option<HistoryEntry> },
    /// Break reached zero; the task waits in focus mode
    BreakCompleted,
}

/// Which recovery path startup took
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    NoSnapshot,
    /// Running focus with time left; waits for the user to resume
    FocusRestored { elapsed_seconds: u32 },
    /// Running focus ran out while the process was gone
    FocusCompleted { entry: Option<HistoryEntry> },
    /// Running break with time left; ticking again
    BreakResumed { elapsed_seconds: u32 },
    /// Running break ran out while the process was gone
    BreakCompleted,
    /// Nothing was running; restored as saved
    PausedRestored,
}

/// Drives a task through focus and break phases
pub struct TimerMachine {
    state: TimerState,
    store: Arc<dyn SessionStore>,
    recorder: SessionRecorder,
    ticker: Box<dyn TickSource>,
    clock: Arc<dyn Clock>,
    notifier: Option<Arc<dyn Notifier>>,
    completion_ui: Option<Arc<dyn CompletionUi>>,
    incomplete_threshold_secs: u32,
}

impl TimerMachine {
    /// Create an idle machine
    pub fn new(store: Arc<dyn SessionStore>, ticker: Box<dyn TickSource>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            state: TimerState::default(),
            recorder: SessionRecorder::new(store.clone(), clock.clone()),
            store,
            ticker,
            clock,
            notifier: None,
            completion_ui: None,
            incomplete_threshold_secs: DEFAULT_INCOMPLETE_THRESHOLD_SECS,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.recorder = SessionRecorder::new(self.store.clone(), clock.clone());
        self.clock = clock;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_completion_ui(mut self, completion_ui: Arc<dyn CompletionUi>) -> Self {
        self.completion_ui = Some(completion_ui);
        self
    }

    /// Seconds of focus after which a stopped task is saved as incomplete
    pub fn with_incomplete_threshold(mut self, secs: u32) -> Self {
        self.incomplete_threshold_secs = secs;
        self
    }

    /// Load a task with full counters, replacing whatever was loaded
    ///
    /// Nothing starts counting until [`TimerMachine::toggle`].
    pub fn start_task(&mut self, task: Task) -> Result<Transition, TimerError> {
        task.validate().map_err(TimerError::InvalidTask)?;

        self.ticker.cancel();
        if let Some(previous) = &self.state.current_task {
            tracing::info!("Replacing loaded task '{}'", previous.name);
        }
        tracing::info!(
            "Loaded task '{}' ({}m focus / {}m break)",
            task.name,
            task.work_duration_minutes,
            task.break_duration_minutes
        );
        self.state = TimerState::loaded(task);
        self.save_snapshot();
        Ok(Transition::TaskLoaded)
    }

    /// Load an incomplete task where it was left off
    ///
    /// Only allowed when idle. The record is removed from the store first so
    /// it can be resumed at most once.
    pub fn resume_task(&mut self, record: &IncompleteTaskRecord) -> Result<Transition, TimerError> {
        if self.state.phase != Phase::Idle {
            tracing::debug!("Ignoring resume of '{}': timer is busy", record.task.name);
            return Err(TimerError::NotIdle);
        }
        record.task.validate().map_err(TimerError::InvalidTask)?;

        match self.store.remove_incomplete_task(record.id) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("Incomplete task {} is no longer stored", record.id);
                return Err(TimerError::UnknownRecord(record.id));
            }
            Err(e) => tracing::warn!("Failed to remove incomplete task {}: {:#}", record.id, e),
        }

        let mut state = TimerState::loaded(record.task.clone());
        state.focus_remaining_seconds = record
            .focus_remaining_seconds
            .min(record.task.work_seconds());
        tracing::info!(
            "Resumed task '{}' with {}s of focus left",
            record.task.name,
            state.focus_remaining_seconds
        );
        self.state = state;
        self.save_snapshot();
        Ok(Transition::TaskLoaded)
    }

    /// Start focus, switch to a break, or abandon the break
    pub fn toggle(&mut self) -> Result<Transition, TimerError> {
        let transition = match self.state.phase {
            Phase::Idle => {
                tracing::debug!("Ignoring toggle: no task loaded");
                return Err(TimerError::NoActiveTask);
            }
            Phase::FocusReady => {
                self.start_ticking(Mode::Focus, Phase::FocusRunning);
                tracing::info!(
                    "Focus started with {}s left",
                    self.state.focus_remaining_seconds
                );
                self.notify("Focus session active! Stay concentrated.", 3);
                Transition::FocusStarted
            }
            Phase::FocusRunning => {
                self.state.break_remaining_seconds = self.full_break_seconds();
                self.start_ticking(Mode::Break, Phase::BreakRunning);
                tracing::info!(
                    "Break started, focus paused at {}s",
                    self.state.focus_remaining_seconds
                );
                self.notify("Break started! Take a moment to relax.", 3);
                Transition::BreakStarted
            }
            Phase::BreakRunning => {
                self.enter_focus_ready();
                tracing::info!("Break cancelled, back to focus");
                self.notify("Back to focus mode.", 3);
                Transition::BreakCancelled
            }
        };

        self.save_snapshot();
        Ok(transition)
    }

    /// Unload the current task
    ///
    /// A focus session stopped after enough progress is kept as an
    /// incomplete task. The active-session snapshot is always cleared.
    pub fn stop(&mut self) -> Result<Transition, TimerError> {
        let Some(task) = self.state.current_task.clone() else {
            tracing::debug!("Ignoring stop: no task loaded");
            return Err(TimerError::NoActiveTask);
        };

        self.ticker.cancel();
        let state = std::mem::take(&mut self.state);

        let spent = task
            .work_seconds()
            .saturating_sub(state.focus_remaining_seconds);
        let saved = if state.mode == Mode::Focus && spent > self.incomplete_threshold_secs {
            match self
                .recorder
                .record_interruption(&task, state.focus_remaining_seconds)
            {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Failed to save incomplete task '{}': {:#}", task.name, e);
                    None
                }
            }
        } else {
            None
        };

        if saved.is_some() {
            self.notify(
                "Progress saved! Type 'incomplete' to list it and 'resume <#>' to continue.",
                4,
            );
        } else {
            self.notify("Task stopped.", 2);
        }

        self.clear_snapshot();
        tracing::info!("Stopped task '{}' after {}s of focus", task.name, spent);
        Ok(Transition::Stopped { saved })
    }

    /// Unload the task without recording anything
    ///
    /// Used before wiping stored data; no notification is sent.
    pub fn reset(&mut self) {
        self.ticker.cancel();
        if let Some(task) = self.state.current_task.take() {
            tracing::info!("Discarded task '{}'", task.name);
        }
        self.state = TimerState::default();
        self.clear_snapshot();
    }

    /// Advance the active countdown by one second
    ///
    /// Ticks from a generation other than the active one are dropped.
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        if self.ticker.active() != Some(generation) {
            tracing::debug!(generation, "Ignoring stale tick");
            return TickOutcome::Ignored;
        }

        match self.state.phase {
            Phase::FocusRunning => {
                self.state.focus_remaining_seconds =
                    self.state.focus_remaining_seconds.saturating_sub(1);
                if self.state.focus_remaining_seconds == 0 {
                    TickOutcome::FocusCompleted {
                        entry: self.complete_focus(),
                    }
                } else {
                    TickOutcome::Counting {
                        remaining_seconds: self.state.focus_remaining_seconds,
                    }
                }
            }
            Phase::BreakRunning => {
                self.state.break_remaining_seconds =
                    self.state.break_remaining_seconds.saturating_sub(1);
                if self.state.break_remaining_seconds == 0 {
                    self.complete_break();
                    TickOutcome::BreakCompleted
                } else {
                    TickOutcome::Counting {
                        remaining_seconds: self.state.break_remaining_seconds,
                    }
                }
            }
            Phase::Idle | Phase::FocusReady => {
                tracing::debug!(generation, "Ignoring tick: nothing is running");
                TickOutcome::Ignored
            }
        }
    }

    /// Recover the session saved by a previous run
    ///
    /// The snapshot is consumed whichever branch is taken. Time that passed
    /// while the process was gone is charged to the countdown that was
    /// running.
    pub fn restore_session(&mut self) -> RestoreOutcome {
        let snapshot = match self.store.take_active_session() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return RestoreOutcome::NoSnapshot,
            Err(e) => {
                tracing::warn!("Failed to read session snapshot: {:#}", e);
                return RestoreOutcome::NoSnapshot;
            }
        };
        if let Err(reason) = snapshot.validate() {
            tracing::warn!("Discarding invalid session snapshot: {}", reason);
            return RestoreOutcome::NoSnapshot;
        }

        self.ticker.cancel();
        let elapsed = self.elapsed_since(&snapshot);
        let mut state = TimerState::loaded(snapshot.task.clone());
        state.focus_remaining_seconds = snapshot.focus_remaining_seconds;
        state.break_remaining_seconds = snapshot.break_remaining_seconds;
        self.state = state;

        let outcome = match (snapshot.running, snapshot.mode) {
            (true, Mode::Focus) if elapsed < snapshot.focus_remaining_seconds => {
                self.state.focus_remaining_seconds -= elapsed;
                self.notify("Focus session restored! Continue where you left off.", 4);
                RestoreOutcome::FocusRestored {
                    elapsed_seconds: elapsed,
                }
            }
            (true, Mode::Focus) => {
                self.state.focus_remaining_seconds = 0;
                RestoreOutcome::FocusCompleted {
                    entry: self.complete_focus(),
                }
            }
            (true, Mode::Break) if elapsed < snapshot.break_remaining_seconds => {
                self.state.break_remaining_seconds -= elapsed;
                self.start_ticking(Mode::Break, Phase::BreakRunning);
                self.notify("Break session restored!", 3);
                RestoreOutcome::BreakResumed {
                    elapsed_seconds: elapsed,
                }
            }
            (true, Mode::Break) => {
                self.complete_break();
                RestoreOutcome::BreakCompleted
            }
            (false, mode) => {
                if mode == Mode::Break {
                    self.state.break_remaining_seconds = self.full_break_seconds();
                }
                self.notify("Focus session restored!", 3);
                RestoreOutcome::PausedRestored
            }
        };

        tracing::info!(
            "Restored session for '{}' after {}s: {:?}",
            snapshot.task.name,
            elapsed,
            outcome
        );
        if self.state.current_task.is_some() {
            self.save_snapshot();
        }
        outcome
    }

    /// Persist the current state; returns whether a snapshot was written
    pub fn save_snapshot(&self) -> bool {
        let Some(snapshot) = self.state.snapshot(self.clock.now()) else {
            return false;
        };
        match self.store.save_active_session(&snapshot) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to save session snapshot: {:#}", e);
                false
            }
        }
    }

    pub fn display_projection(&self) -> DisplayProjection {
        self.state.projection()
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.state.current_task.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Generation of the active tick source, if anything is ticking
    pub fn active_tick(&self) -> Option<u64> {
        self.ticker.active()
    }

    fn complete_focus(&mut self) -> Option<HistoryEntry> {
        self.ticker.cancel();
        let state = std::mem::take(&mut self.state);
        let task = state.current_task?;

        let entry = match self
            .recorder
            .record_completion(&task, task.work_duration_minutes)
        {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Failed to record completed session '{}': {:#}", task.name, e);
                None
            }
        };

        if let Some(ui) = &self.completion_ui {
            ui.play_alert();
        }
        self.notify("Congratulations! Session completed successfully!", 5);
        if let Some(ui) = &self.completion_ui {
            ui.show_completion_celebration();
        }

        self.clear_snapshot();
        tracing::info!("Completed focus session '{}'", task.name);
        entry
    }

    fn complete_break(&mut self) {
        self.enter_focus_ready();
        if let Some(ui) = &self.completion_ui {
            ui.play_alert();
        }
        self.notify("Break time is over! Ready to focus again?", 5);
        self.save_snapshot();
        tracing::info!("Break finished");
    }

    fn start_ticking(&mut self, mode: Mode, phase: Phase) {
        let generation = self.ticker.restart();
        self.state.mode = mode;
        self.state.phase = phase;
        tracing::debug!(generation, ?phase, "Ticking");
    }

    /// Cancel ticking, refill the break, wait in focus mode
    fn enter_focus_ready(&mut self) {
        self.ticker.cancel();
        self.state.break_remaining_seconds = self.full_break_seconds();
        self.state.mode = Mode::Focus;
        self.state.phase = Phase::FocusReady;
    }

    fn full_break_seconds(&self) -> u32 {
        self.state
            .current_task
            .as_ref()
            .map_or(0, Task::break_seconds)
    }

    fn elapsed_since(&self, snapshot: &SessionSnapshot) -> u32 {
        let elapsed = (self.clock.now() - snapshot.saved_at).num_seconds().max(0);
        u32::try_from(elapsed).unwrap_or(u32::MAX)
    }

    fn clear_snapshot(&self) {
        if let Err(e) = self.store.clear_active_session() {
            tracing::warn!("Failed to clear session snapshot: {:#}", e);
        }
    }

    fn notify(&self, message: &str, secs: u64) {
        tracing::debug!("Notify: {}", message);
        if let Some(notifier) = &self.notifier {
            notifier.notify(message, Duration::from_secs(secs));
        }
    }
}
