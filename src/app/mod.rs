//! Terminal host and main event loop
//!
//! The host owns the timer machine, delivers its ticks, reads commands from
//! stdin and prints what the machine reports.

mod command;
mod terminal;

pub use command::{parse, Command, PrefsUpdate, HELP};
pub use terminal::TerminalUi;

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::stats::calculate_user_stats;
use crate::store::{JsonStore, MemoryStore, Preferences, SessionStore, StoreLimits};
use crate::task::{
    find_template, Task, TaskTemplate, MAX_BREAK_MINUTES, MAX_WORK_MINUTES, TEMPLATES,
};
use crate::theme::toggle_theme;
use crate::timer::ticker::TICK_PERIOD;
use crate::timer::{
    IntervalTicker, RestoreOutcome, Tick, TickOutcome, TimerError, TimerMachine, Transition,
};

/// History entries shown by the `history` command
const HISTORY_SHOWN: usize = 10;

/// Whether the loop keeps going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Main application struct
pub struct App {
    config: Config,
    store: Arc<dyn SessionStore>,
    machine: TimerMachine,
    ui: Arc<TerminalUi>,
    tick_rx: mpsc::UnboundedReceiver<Tick>,
}

impl App {
    /// Create the host on the configured data directory
    ///
    /// Falls back to an in-memory store when the directory cannot be used.
    pub fn new(config: Config) -> Self {
        let store = open_store(&config);
        Self::with_store(config, store)
    }

    /// Create the host on an explicit store
    pub fn with_store(config: Config, store: Arc<dyn SessionStore>) -> Self {
        seed_preferences(store.as_ref(), &config);
        let sound_enabled = store
            .preferences()
            .map(|p| p.sound_enabled)
            .unwrap_or(true);
        let ui = Arc::new(TerminalUi::new(sound_enabled));

        let (ticker, tick_rx) = IntervalTicker::new(TICK_PERIOD);
        let mut machine = TimerMachine::new(store.clone(), Box::new(ticker))
            .with_completion_ui(ui.clone())
            .with_incomplete_threshold(config.incomplete_threshold_secs);
        if config.notifications_enabled {
            machine = machine.with_notifier(ui.clone());
        }

        Self {
            config,
            store,
            machine,
            ui,
            tick_rx,
        }
    }

    /// Restore the previous session, then process ticks and commands until quit
    pub async fn run(&mut self) -> Result<()> {
        println!("focusflow - type 'help' for commands, <enter> to toggle the timer");

        let outcome = self.machine.restore_session();
        if outcome != RestoreOutcome::NoSnapshot {
            self.print_status();
        }

        let result = self.event_loop().await;

        if self.machine.save_snapshot() {
            tracing::info!("Saved session snapshot on exit");
        }
        tracing::info!("focusflow exiting");
        result
    }

    async fn event_loop(&mut self) -> Result<()> {
        let mut input_rx = spawn_stdin_reader();

        loop {
            tokio::select! {
                Some(tick) = self.tick_rx.recv() => self.handle_tick(tick),
                line = input_rx.recv() => {
                    let Some(line) = line else {
                        tracing::info!("Input closed");
                        return Ok(());
                    };
                    if self.handle_line(&line) == Flow::Quit {
                        return Ok(());
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted");
                    return Ok(());
                }
            }
        }
    }

    fn handle_tick(&mut self, tick: Tick) {
        match self.machine.tick(tick.generation) {
            TickOutcome::Ignored => {}
            TickOutcome::Counting { remaining_seconds } => {
                if remaining_seconds % 60 == 0 || remaining_seconds <= 3 {
                    self.print_status();
                }
            }
            TickOutcome::FocusCompleted { .. } | TickOutcome::BreakCompleted => {
                self.print_status();
            }
        }
    }

    fn handle_line(&mut self, line: &str) -> Flow {
        let command = match command::parse(line) {
            Ok(command) => command,
            Err(message) => {
                println!("  {}", message);
                return Flow::Continue;
            }
        };
        tracing::debug!(?command, "Handling command");

        match command {
            Command::Templates => println!("{}", terminal::render_templates()),
            Command::Start(which) => match resolve_template(&which) {
                Some(template) => {
                    let result = self.machine.start_task(Task::from_template(template));
                    self.report(result);
                }
                None => println!("  No template '{}'", which),
            },
            Command::Quick {
                name,
                category,
                work_minutes,
                break_minutes,
            } => {
                let mut task = Task::quick(name, category, &self.preferences());
                if let Some(work) = work_minutes {
                    task.work_duration_minutes = work;
                }
                if let Some(brk) = break_minutes {
                    task.break_duration_minutes = brk;
                }
                let result = self.machine.start_task(task);
                self.report(result);
            }
            Command::Toggle => {
                let result = self.machine.toggle();
                self.report(result);
            }
            Command::Stop => {
                let result = self.machine.stop();
                self.report(result);
            }
            Command::Status => self.print_status(),
            Command::History => match self.store.history() {
                Ok(history) => println!("{}", terminal::render_history(&history, HISTORY_SHOWN)),
                Err(e) => println!("  Could not read history: {:#}", e),
            },
            Command::Incomplete => match self.store.incomplete_tasks() {
                Ok(records) => println!("{}", terminal::render_incomplete(&records)),
                Err(e) => println!("  Could not read saved tasks: {:#}", e),
            },
            Command::Resume(number) => self.resume(number),
            Command::Stats => match self.store.history() {
                Ok(history) => {
                    let stats = calculate_user_stats(&history, Local::now());
                    println!("{}", terminal::render_stats(&stats));
                }
                Err(e) => println!("  Could not read history: {:#}", e),
            },
            Command::Theme => match toggle_theme(self.store.as_ref()) {
                Ok(theme) => println!("  Theme: {} ({})", theme, theme.meta_color()),
                Err(e) => println!("  Could not switch theme: {:#}", e),
            },
            Command::Prefs(None) => {
                println!("{}", terminal::render_preferences(&self.preferences()))
            }
            Command::Prefs(Some(update)) => self.update_preferences(update),
            Command::Export(path) => {
                let path = path.unwrap_or_else(default_backup_path);
                match export_to(self.store.as_ref(), &path) {
                    Ok(()) => println!("  Data exported to {}", path.display()),
                    Err(e) => println!("  Export failed: {:#}", e),
                }
            }
            Command::Import(path) => match import_from(self.store.as_ref(), &path) {
                Ok(()) => {
                    self.sync_sound();
                    println!("  Data imported successfully");
                }
                Err(e) => println!("  Import failed: {:#}", e),
            },
            Command::Reset { confirmed: false } => println!(
                "  This deletes all history, saved tasks and preferences. \
                 Type 'reset confirm' to proceed."
            ),
            Command::Reset { confirmed: true } => self.reset_data(),
            Command::Help => println!("{}", HELP),
            Command::Quit => return Flow::Quit,
        }

        Flow::Continue
    }

    fn resume(&mut self, number: usize) {
        let records = match self.store.incomplete_tasks() {
            Ok(records) => records,
            Err(e) => {
                println!("  Could not read saved tasks: {:#}", e);
                return;
            }
        };
        match records.get(number - 1) {
            Some(record) => {
                let result = self.machine.resume_task(record);
                self.report(result);
            }
            None => println!("  No saved task #{}", number),
        }
    }

    fn update_preferences(&self, update: PrefsUpdate) {
        if !(1..=MAX_WORK_MINUTES).contains(&update.work_minutes) {
            println!("  Work duration must be 1-{} minutes", MAX_WORK_MINUTES);
            return;
        }
        if !(1..=MAX_BREAK_MINUTES).contains(&update.break_minutes) {
            println!("  Break duration must be 1-{} minutes", MAX_BREAK_MINUTES);
            return;
        }

        let current = self.preferences();
        let prefs = Preferences {
            default_work_duration: update.work_minutes,
            default_break_duration: update.break_minutes,
            sound_enabled: update.sound.unwrap_or(current.sound_enabled),
        };
        match self.store.update_preferences(prefs.clone()) {
            Ok(()) => {
                self.ui.set_sound_enabled(prefs.sound_enabled);
                tracing::info!(?prefs, "Preferences updated");
                println!("  Preferences updated successfully");
                println!("{}", terminal::render_preferences(&prefs));
            }
            Err(e) => println!("  Could not save preferences: {:#}", e),
        }
    }

    /// Drop the loaded task and every stored record; the theme survives
    fn reset_data(&mut self) {
        self.machine.reset();
        if let Err(e) = self.store.reset_all() {
            println!("  Reset failed: {:#}", e);
            return;
        }
        seed_preferences(self.store.as_ref(), &self.config);
        self.sync_sound();
        tracing::info!("All data reset");
        println!("  All data has been reset successfully.");
    }

    fn sync_sound(&self) {
        self.ui.set_sound_enabled(self.preferences().sound_enabled);
    }

    fn report(&self, result: Result<Transition, TimerError>) {
        match result {
            Ok(transition) => {
                tracing::debug!(?transition, "Timer transition");
                self.print_status();
            }
            Err(e) => println!("  Cannot do that: {}", e),
        }
    }

    fn print_status(&self) {
        let projection = self.machine.display_projection();
        println!(
            "{}",
            terminal::status_line(&projection, self.machine.current_task())
        );
    }

    fn preferences(&self) -> Preferences {
        self.store.preferences().unwrap_or_else(|e| {
            tracing::warn!("Failed to read preferences, using config defaults: {:#}", e);
            self.config.default_preferences()
        })
    }
}

/// Template by 1-based number or by name
fn resolve_template(which: &str) -> Option<&'static TaskTemplate> {
    match which.trim().parse::<usize>() {
        Ok(number) => number.checked_sub(1).and_then(|i| TEMPLATES.get(i)),
        Err(_) => find_template(which),
    }
}

fn default_backup_path() -> PathBuf {
    PathBuf::from(format!(
        "focus-timer-backup-{}.json",
        Local::now().format("%Y-%m-%d")
    ))
}

fn export_to(store: &dyn SessionStore, path: &Path) -> Result<()> {
    let data = store.export_data()?;
    let content = serde_json::to_string_pretty(&data).context("Failed to serialize backup")?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

fn import_from(store: &dyn SessionStore, path: &Path) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let data: serde_json::Value =
        serde_json::from_str(&content).context("Backup is not valid JSON")?;
    store.import_data(&data)
}

fn open_store(config: &Config) -> Arc<dyn SessionStore> {
    match JsonStore::from_config(config) {
        Ok(store) => {
            tracing::info!("Using data directory {}", config.data_dir.display());
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!("Failed to open data directory, running in memory: {:#}", e);
            println!(
                "  Warning: cannot use {}; sessions will not be saved.",
                config.data_dir.display()
            );
            Arc::new(MemoryStore::with_limits(StoreLimits {
                history: config.history_limit,
                incomplete: config.incomplete_limit,
            }))
        }
    }
}

/// Apply configured default durations to a store still on built-in preferences
fn seed_preferences(store: &dyn SessionStore, config: &Config) {
    let configured = config.default_preferences();
    match store.preferences() {
        Ok(current) if current == Preferences::default() && current != configured => {
            if let Err(e) = store.update_preferences(configured) {
                tracing::warn!("Failed to apply configured preferences: {:#}", e);
            }
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("Failed to read preferences: {:#}", e),
    }
}

/// Read stdin on a dedicated thread so a pending read never blocks shutdown
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}
