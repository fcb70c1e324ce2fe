//! User statistics derived from the history log
//!
//! Only completed sessions count. Day boundaries are taken in the time zone
//! of the `now` passed in, so callers pass `Local::now()` for calendar days.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, NaiveDate, TimeZone};

use crate::store::HistoryEntry;
use crate::task::Category;

/// Aggregated statistics for the stats view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserStats {
    pub total_sessions: u32,
    pub total_focus_minutes: u32,
    pub today_sessions: u32,
    /// Sessions completed in the last seven days
    pub week_sessions: u32,
    /// Average session length in whole minutes
    pub average_session_minutes: u32,
    pub most_used_category: Option<Category>,
    /// Consecutive days ending today with at least one session
    pub current_streak: u32,
}

/// Calculate stats from history as seen at `now`
pub fn calculate_user_stats<Tz: TimeZone>(history: &[HistoryEntry], now: DateTime<Tz>) -> UserStats {
    let tz = now.timezone();
    let today = now.date_naive();
    let week_start = now.clone() - Duration::days(7);

    let mut stats = UserStats::default();
    let mut category_counts: HashMap<Category, u32> = HashMap::new();
    let mut days: BTreeSet<NaiveDate> = BTreeSet::new();

    for entry in history.iter().filter(|entry| entry.completed) {
        let completed_at = entry.completed_at.with_timezone(&tz);
        let day = completed_at.date_naive();

        stats.total_sessions += 1;
        stats.total_focus_minutes = stats
            .total_focus_minutes
            .saturating_add(entry.duration_minutes);
        if day == today {
            stats.today_sessions += 1;
        }
        if completed_at >= week_start {
            stats.week_sessions += 1;
        }
        *category_counts.entry(entry.category).or_default() += 1;
        days.insert(day);
    }

    if stats.total_sessions > 0 {
        let average = f64::from(stats.total_focus_minutes) / f64::from(stats.total_sessions);
        stats.average_session_minutes = average.round() as u32;
    }

    // Ties go to the category listed first
    stats.most_used_category = Category::ALL
        .into_iter()
        .filter_map(|category| category_counts.get(&category).map(|count| (category, *count)))
        .fold(None, |best: Option<(Category, u32)>, (category, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((category, count)),
        })
        .map(|(category, _)| category);

    let mut day = today;
    while days.contains(&day) {
        stats.current_streak += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }

    stats
}

/// Encouragement picked from streak and session count
pub fn motivational_message(stats: &UserStats) -> String {
    if stats.current_streak >= 7 {
        format!("Amazing! You're on a {}-day streak!", stats.current_streak)
    } else if stats.current_streak >= 3 {
        format!("Great momentum! {} days in a row!", stats.current_streak)
    } else if stats.total_sessions >= 50 {
        format!(
            "You're a focus champion with {} sessions!",
            stats.total_sessions
        )
    } else if stats.total_sessions >= 10 {
        "You're building great habits! Keep it up!".to_string()
    } else if stats.total_sessions > 0 {
        "Great start! Every session counts!".to_string()
    } else {
        "Ready to start your focus journey?".to_string()
    }
}

/// Format minutes as "1h 05m" or "45m"
pub fn format_focus_time(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;

    if hours > 0 {
        format!("{}h {:02}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;
    use chrono::Utc;

    fn entry(category: Category, minutes: u32, days_ago: i64, completed: bool) -> HistoryEntry {
        let task = Task::new("Task", category, minutes, 5);
        HistoryEntry::new(
            &task,
            minutes,
            completed,
            Utc::now() - Duration::days(days_ago),
        )
    }

    #[test]
    fn test_empty_history() {
        let stats = calculate_user_stats(&[], Utc::now());
        assert_eq!(stats, UserStats::default());
        assert_eq!(
            motivational_message(&stats),
            "Ready to start your focus journey?"
        );
    }

    #[test]
    fn test_counts_only_completed_sessions() {
        let history = vec![
            entry(Category::Work, 50, 0, true),
            entry(Category::Work, 25, 0, false),
            entry(Category::Study, 45, 2, true),
            entry(Category::Reading, 30, 10, true),
        ];

        let stats = calculate_user_stats(&history, Utc::now());
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.total_focus_minutes, 125);
        assert_eq!(stats.today_sessions, 1);
        assert_eq!(stats.week_sessions, 2);
        assert_eq!(stats.average_session_minutes, 42);
    }

    #[test]
    fn test_most_used_category_ties() {
        let history = vec![
            entry(Category::Reading, 30, 0, true),
            entry(Category::Study, 30, 0, true),
            entry(Category::Reading, 30, 1, true),
            entry(Category::Study, 30, 1, true),
        ];
        let stats = calculate_user_stats(&history, Utc::now());
        assert_eq!(stats.most_used_category, Some(Category::Study));
    }

    #[test]
    fn test_streak_requires_today() {
        let now = Utc::now();
        let history = vec![
            entry(Category::Work, 25, 1, true),
            entry(Category::Work, 25, 2, true),
        ];
        assert_eq!(calculate_user_stats(&history, now).current_streak, 0);

        let history = vec![
            entry(Category::Work, 25, 0, true),
            entry(Category::Work, 25, 0, true),
            entry(Category::Work, 25, 1, true),
            entry(Category::Work, 25, 2, true),
            entry(Category::Work, 25, 4, true),
        ];
        let stats = calculate_user_stats(&history, now);
        assert_eq!(stats.current_streak, 3);
        assert_eq!(
            motivational_message(&stats),
            "Great momentum! 3 days in a row!"
        );
    }

    #[test]
    fn test_motivational_thresholds() {
        let mut stats = UserStats {
            total_sessions: 12,
            ..Default::default()
        };
        assert_eq!(
            motivational_message(&stats),
            "You're building great habits! Keep it up!"
        );

        stats.total_sessions = 50;
        assert_eq!(
            motivational_message(&stats),
            "You're a focus champion with 50 sessions!"
        );

        stats.current_streak = 7;
        assert_eq!(
            motivational_message(&stats),
            "Amazing! You're on a 7-day streak!"
        );
    }

    #[test]
    fn test_format_focus_time() {
        assert_eq!(format_focus_time(0), "0m");
        assert_eq!(format_focus_time(45), "45m");
        assert_eq!(format_focus_time(65), "1h 05m");
    }
}
