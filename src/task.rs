//! Focus task model
//!
//! A `Task` describes one focus session: what is being worked on and how long
//! the work and break phases last. Tasks are immutable once created.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Preferences;

/// Longest accepted work phase in minutes
pub const MAX_WORK_MINUTES: u32 = 120;

/// Longest accepted break phase in minutes
pub const MAX_BREAK_MINUTES: u32 = 30;

/// Kind of work a task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Study,
    Reading,
    Exercise,
    Creative,
    Other,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 6] = [
        Category::Work,
        Category::Study,
        Category::Reading,
        Category::Exercise,
        Category::Creative,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Study => "study",
            Category::Reading => "reading",
            Category::Exercise => "exercise",
            Category::Creative => "creative",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// An immutable description of a focus task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub name: String,
    pub category: Category,
    pub work_duration_minutes: u32,
    pub break_duration_minutes: u32,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a task stamped with the current time
    pub fn new(
        name: impl Into<String>,
        category: Category,
        work_duration_minutes: u32,
        break_duration_minutes: u32,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            work_duration_minutes,
            break_duration_minutes,
            created_at: Utc::now(),
        }
    }

    /// Create a task from a template
    pub fn from_template(template: &TaskTemplate) -> Self {
        Self::new(
            template.name,
            template.category,
            template.work_duration_minutes,
            template.break_duration_minutes,
        )
    }

    /// Create a task using the user's default durations
    pub fn quick(name: impl Into<String>, category: Category, preferences: &Preferences) -> Self {
        Self::new(
            name,
            category,
            preferences.default_work_duration,
            preferences.default_break_duration,
        )
    }

    /// Work phase length in seconds
    pub fn work_seconds(&self) -> u32 {
        self.work_duration_minutes.saturating_mul(60)
    }

    /// Break phase length in seconds
    pub fn break_seconds(&self) -> u32 {
        self.break_duration_minutes.saturating_mul(60)
    }

    /// Check the task against the limits accepted by the task form
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("task name must not be empty".to_string());
        }
        if !(1..=MAX_WORK_MINUTES).contains(&self.work_duration_minutes) {
            return Err(format!(
                "work duration must be between 1 and {} minutes",
                MAX_WORK_MINUTES
            ));
        }
        if !(1..=MAX_BREAK_MINUTES).contains(&self.break_duration_minutes) {
            return Err(format!(
                "break duration must be between 1 and {} minutes",
                MAX_BREAK_MINUTES
            ));
        }
        Ok(())
    }
}

/// A predefined task shape offered on the home screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTemplate {
    pub name: &'static str,
    pub category: Category,
    pub work_duration_minutes: u32,
    pub break_duration_minutes: u32,
    pub description: &'static str,
}

/// Built-in templates
pub const TEMPLATES: &[TaskTemplate] = &[
    TaskTemplate {
        name: "Deep Work",
        category: Category::Work,
        work_duration_minutes: 50,
        break_duration_minutes: 10,
        description: "Extended focus sessions for complex tasks",
    },
    TaskTemplate {
        name: "Study Session",
        category: Category::Study,
        work_duration_minutes: 45,
        break_duration_minutes: 15,
        description: "Perfect for learning and academic work",
    },
    TaskTemplate {
        name: "Reading Time",
        category: Category::Reading,
        work_duration_minutes: 30,
        break_duration_minutes: 5,
        description: "Focused reading with short breaks",
    },
    TaskTemplate {
        name: "Exercise Break",
        category: Category::Exercise,
        work_duration_minutes: 20,
        break_duration_minutes: 10,
        description: "Quick workout sessions",
    },
    TaskTemplate {
        name: "Creative Work",
        category: Category::Creative,
        work_duration_minutes: 40,
        break_duration_minutes: 10,
        description: "For design, writing, and artistic projects",
    },
    TaskTemplate {
        name: "Quick Task",
        category: Category::Other,
        work_duration_minutes: 15,
        break_duration_minutes: 5,
        description: "Short bursts for quick tasks",
    },
];

/// Find a built-in template by name (case-insensitive)
pub fn find_template(name: &str) -> Option<&'static TaskTemplate> {
    TEMPLATES
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
}
