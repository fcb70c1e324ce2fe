//! Line-oriented terminal presentation

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;

use crate::stats::{format_focus_time, motivational_message, UserStats};
use crate::store::{HistoryEntry, IncompleteTaskRecord, Preferences};
use crate::task::{Task, TEMPLATES};
use crate::timer::{format_clock, CompletionUi, DisplayProjection, Notifier};

const PROGRESS_WIDTH: usize = 24;

/// Prints notifications and completion feedback to the terminal
#[derive(Debug)]
pub struct TerminalUi {
    sound_enabled: AtomicBool,
}

impl TerminalUi {
    pub fn new(sound_enabled: bool) -> Self {
        Self {
            sound_enabled: AtomicBool::new(sound_enabled),
        }
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::Relaxed)
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.sound_enabled.store(enabled, Ordering::Relaxed);
    }
}

impl Notifier for TerminalUi {
    fn notify(&self, message: &str, _duration: Duration) {
        println!("  >> {}", message);
    }
}

impl CompletionUi for TerminalUi {
    fn show_completion_celebration(&self) {
        println!("  *  *  *  Well done!  *  *  *");
    }

    fn play_alert(&self) {
        if self.sound_enabled() {
            print!("\x07");
            let _ = std::io::stdout().flush();
        }
    }
}

/// `[#####-----]` for a percentage
pub fn progress_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * PROGRESS_WIDTH as f64).round() as usize;
    let filled = filled.min(PROGRESS_WIDTH);
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled)
    )
}

/// One-line timer status
pub fn status_line(projection: &DisplayProjection, task: Option<&Task>) -> String {
    let mut line = format!(
        "{:<14} {} {} {:>3.0}%",
        projection.label,
        projection.time_text,
        progress_bar(projection.progress_percent),
        projection.progress_percent
    );
    if let Some(task) = task {
        line.push_str(&format!("  {} ({})", task.name, task.category));
    }
    line
}

pub fn render_templates() -> String {
    TEMPLATES
        .iter()
        .enumerate()
        .map(|(i, t)| {
            format!(
                "  {}. {:<15} {:<9} {:>3}m / {:>2}m  {}",
                i + 1,
                t.name,
                t.category,
                t.work_duration_minutes,
                t.break_duration_minutes,
                t.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_history(history: &[HistoryEntry], limit: usize) -> String {
    if history.is_empty() {
        return "  No sessions yet.".to_string();
    }
    history
        .iter()
        .take(limit)
        .map(|entry| {
            format!(
                "  {} {:<24} {:<9} {:>3}m  {}",
                if entry.completed { "+" } else { "-" },
                entry.task_name,
                entry.category,
                entry.duration_minutes,
                entry
                    .completed_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_incomplete(records: &[IncompleteTaskRecord]) -> String {
    if records.is_empty() {
        return "  Nothing saved for later.".to_string();
    }
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            format!(
                "  {}. {:<24} {} left, {} spent  (saved {})",
                i + 1,
                record.task.name,
                format_clock(record.focus_remaining_seconds),
                format_clock(record.total_time_spent_seconds),
                record.saved_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_stats(stats: &UserStats) -> String {
    let most_used = stats
        .most_used_category
        .map_or_else(|| "-".to_string(), |c| c.to_string());
    format!(
        "  Sessions:       {} total, {} today, {} this week\n  \
         Focus time:     {}\n  \
         Average:        {}m\n  \
         Day streak:     {}\n  \
         Favorite:       {}\n\n  {}",
        stats.total_sessions,
        stats.today_sessions,
        stats.week_sessions,
        format_focus_time(stats.total_focus_minutes),
        stats.average_session_minutes,
        stats.current_streak,
        most_used,
        motivational_message(stats)
    )
}

pub fn render_preferences(prefs: &Preferences) -> String {
    format!(
        "  Defaults: {}m focus / {}m break, sound {}",
        prefs.default_work_duration,
        prefs.default_break_duration,
        if prefs.sound_enabled { "on" } else { "off" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Category;
    use crate::timer::Mode;

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "-".repeat(24)));
        assert_eq!(progress_bar(100.0), format!("[{}]", "#".repeat(24)));
        assert_eq!(progress_bar(50.0).matches('#').count(), 12);
    }

    #[test]
    fn test_status_line_names_task() {
        let task = Task::new("Write", Category::Work, 25, 5);
        let projection = crate::timer::display::project(Mode::Focus, 1500, 300, Some(&task));
        let line = status_line(&projection, Some(&task));
        assert!(line.starts_with("Work Time"));
        assert!(line.contains("25:00"));
        assert!(line.contains("Write (work)"));
    }

    #[test]
    fn test_render_preferences() {
        let prefs = Preferences {
            sound_enabled: false,
            ..Preferences::default()
        };
        assert_eq!(
            render_preferences(&prefs),
            "  Defaults: 25m focus / 5m break, sound off"
        );
    }

    #[test]
    fn test_sound_switch() {
        let ui = TerminalUi::new(true);
        ui.set_sound_enabled(false);
        assert!(!ui.sound_enabled());
    }

    #[test]
    fn test_templates_are_numbered() {
        let rendered = render_templates();
        assert!(rendered.contains("1. Deep Work"));
        assert!(rendered.contains("6. Quick Task"));
    }
}
