//! Display projection of the timer state
//!
//! Everything here is a pure function of the timer's counters and task; the
//! renderer decides how to draw it.

use crate::task::Task;

use super::Mode;

/// Focus total shown when no task is loaded
const DEFAULT_FOCUS_SECONDS: u32 = 25 * 60;

/// Break total shown when no task is loaded
const DEFAULT_BREAK_SECONDS: u32 = 5 * 60;

/// Numbers and labels a renderer needs to draw the timer
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayProjection {
    pub remaining_seconds: u32,
    pub total_seconds: u32,
    /// Progress through the active phase, 0 to 100
    pub progress_percent: f64,
    pub label: &'static str,
    pub color_mode: Mode,
    /// Remaining time as MM:SS
    pub time_text: String,
}

impl DisplayProjection {
    /// Color token for the active mode
    pub fn color(&self) -> &'static str {
        self.color_mode.color_token()
    }
}

/// Project the timer counters into display values
pub fn project(
    mode: Mode,
    focus_remaining_seconds: u32,
    break_remaining_seconds: u32,
    task: Option<&Task>,
) -> DisplayProjection {
    let (remaining_seconds, total_seconds) = match mode {
        Mode::Focus => (
            focus_remaining_seconds,
            task.map_or(DEFAULT_FOCUS_SECONDS, Task::work_seconds),
        ),
        Mode::Break => (
            break_remaining_seconds,
            task.map_or(DEFAULT_BREAK_SECONDS, Task::break_seconds),
        ),
    };

    let progress_percent = if task.is_some() && total_seconds > 0 {
        let done = f64::from(total_seconds) - f64::from(remaining_seconds);
        (done / f64::from(total_seconds) * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let label = match (task, mode) {
        (None, _) => "Ready to Focus",
        (Some(_), Mode::Focus) => "Work Time",
        (Some(_), Mode::Break) => "Break Time",
    };

    DisplayProjection {
        remaining_seconds,
        total_seconds,
        progress_percent,
        label,
        color_mode: mode,
        time_text: format_clock(remaining_seconds),
    }
}

/// Format seconds as MM:SS; minutes are not wrapped into hours
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Category;

    #[test]
    fn test_idle_projection() {
        let projection = project(Mode::Focus, 0, 0, None);
        assert_eq!(projection.total_seconds, 1500);
        assert_eq!(projection.progress_percent, 0.0);
        assert_eq!(projection.label, "Ready to Focus");
        assert_eq!(projection.time_text, "00:00");
    }

    #[test]
    fn test_focus_progress() {
        let task = Task::new("Write", Category::Work, 25, 5);
        let projection = project(Mode::Focus, 750, 300, Some(&task));
        assert_eq!(projection.remaining_seconds, 750);
        assert_eq!(projection.total_seconds, 1500);
        assert_eq!(projection.progress_percent, 50.0);
        assert_eq!(projection.label, "Work Time");
        assert_eq!(projection.time_text, "12:30");
        assert_eq!(projection.color(), "#10b981");
    }

    #[test]
    fn test_break_projection() {
        let task = Task::new("Write", Category::Work, 25, 5);
        let projection = project(Mode::Break, 1490, 300, Some(&task));
        assert_eq!(projection.remaining_seconds, 300);
        assert_eq!(projection.total_seconds, 300);
        assert_eq!(projection.progress_percent, 0.0);
        assert_eq!(projection.label, "Break Time");
        assert_eq!(projection.color_mode, Mode::Break);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(120 * 60), "120:00");
    }
}
