//! Recommendation context.
//!
//! A snapshot of time of day and recent behavioral signals, recomputed at
//! the start of every generation cycle and never persisted.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::profile::UserProfile;
use crate::task::Task;

/// Tasks created within this window count as recent.
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// Pending tasks older than this are considered abandoned.
pub const ABANDON_AFTER_DAYS: i64 = 2;

/// Habits above this confidence feed struggles and strengths.
pub const HIGH_CONFIDENCE: f64 = 0.6;

/// Struggle tag added when abandons outnumber completions.
pub const STRUGGLE_TASK_COMPLETION: &str = "task_completion";

/// Strength tag added after more than five recent completions.
pub const STRENGTH_CONSISTENT_COMPLETION: &str = "consistent_completion";

/// Part of the day, from the local wall-clock hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// `[5,12)` morning, `[12,17)` afternoon, `[17,21)` evening, else night.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

/// Derived snapshot for one generation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationContext {
    pub time_of_day: TimeOfDay,
    pub day_of_week: Weekday,
    /// Completed tasks created in the trailing 7 days
    pub recent_task_completions: usize,
    /// Pending tasks created in the trailing 7 days and older than 2 days
    pub recent_task_abandons: usize,
    /// Completed tasks over the whole history
    pub total_tasks_completed: usize,
    pub struggling_areas: Vec<String>,
    pub strengths: Vec<String>,
}

impl RecommendationContext {
    pub fn is_struggling_with(&self, area: &str) -> bool {
        self.struggling_areas.iter().any(|a| a == area)
    }

    pub fn has_strength(&self, strength: &str) -> bool {
        self.strengths.iter().any(|s| s == strength)
    }
}

/// Derive the context from a profile and task snapshot at local time `now`.
pub fn build_context(
    profile: &UserProfile,
    tasks: &[Task],
    now: DateTime<FixedOffset>,
) -> RecommendationContext {
    let now_utc = now.with_timezone(&Utc);
    let recent_cutoff = now_utc - Duration::days(RECENT_WINDOW_DAYS);
    let abandon_cutoff = now_utc - Duration::days(ABANDON_AFTER_DAYS);

    let recent: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.created_at >= recent_cutoff)
        .collect();

    let recent_task_completions = recent.iter().filter(|t| t.is_completed()).count();
    let recent_task_abandons = recent
        .iter()
        .filter(|t| t.is_pending() && t.created_at < abandon_cutoff)
        .count();
    let total_tasks_completed = tasks.iter().filter(|t| t.is_completed()).count();

    let mut struggling_areas = Vec::new();
    let mut strengths = Vec::new();

    if recent_task_abandons > recent_task_completions {
        struggling_areas.push(STRUGGLE_TASK_COMPLETION.to_string());
    }
    if recent_task_completions > 5 {
        strengths.push(STRENGTH_CONSISTENT_COMPLETION.to_string());
    }

    for habit in profile.habits.iter().filter(|h| h.confidence > HIGH_CONFIDENCE) {
        if habit.pattern.contains("struggles") {
            struggling_areas.push(habit.pattern.clone());
        } else {
            strengths.push(habit.pattern.clone());
        }
    }

    RecommendationContext {
        time_of_day: TimeOfDay::from_hour(now.hour()),
        day_of_week: now.weekday(),
        recent_task_completions,
        recent_task_abandons,
        total_tasks_completed,
        struggling_areas,
        strengths,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::UserHabit;
    use crate::task::{TaskPriority, TaskStatus};
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2026, 10, 14, hour, 0, 0)
            .unwrap()
            .fixed_offset()
    }

    fn task(id: &str, status: TaskStatus, age: Duration, now: DateTime<FixedOffset>) -> Task {
        let mut t = Task::new(id, id, TaskPriority::Medium, now.with_timezone(&Utc) - age);
        t.status = status;
        t
    }

    fn habit(pattern: &str, confidence: f64) -> UserHabit {
        UserHabit {
            pattern: pattern.to_string(),
            frequency: 4,
            confidence,
            last_observed: Utc::now(),
        }
    }

    #[test]
    fn test_time_of_day_boundaries() {
        assert_eq!(TimeOfDay::from_hour(4), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(20), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(21), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Night);
    }

    #[test]
    fn test_time_of_day_uses_local_hour() {
        // 06:00 UTC is 23:00 the previous day at -07:00
        let offset = FixedOffset::west_opt(7 * 3600).unwrap();
        let now = at(6).with_timezone(&offset);
        let ctx = build_context(&UserProfile::new("u"), &[], now);
        assert_eq!(ctx.time_of_day, TimeOfDay::Night);
        assert_eq!(ctx.day_of_week, Weekday::Tue);
    }

    #[test]
    fn test_empty_inputs() {
        let ctx = build_context(&UserProfile::new("u"), &[], at(9));
        assert_eq!(ctx.recent_task_completions, 0);
        assert_eq!(ctx.recent_task_abandons, 0);
        assert_eq!(ctx.total_tasks_completed, 0);
        assert!(ctx.struggling_areas.is_empty());
        assert!(ctx.strengths.is_empty());
        assert_eq!(ctx.day_of_week, Weekday::Wed);
    }

    #[test]
    fn test_counts_and_windows() {
        let now = at(9);
        let tasks = vec![
            task("done-recent", TaskStatus::Completed, Duration::days(1), now),
            task("done-old", TaskStatus::Completed, Duration::days(30), now),
            task("abandoned", TaskStatus::Pending, Duration::days(3), now),
            task("fresh", TaskStatus::Pending, Duration::hours(5), now),
            task("stale", TaskStatus::Pending, Duration::days(10), now),
            task("started", TaskStatus::InProgress, Duration::days(4), now),
        ];
        let ctx = build_context(&UserProfile::new("u"), &tasks, now);
        assert_eq!(ctx.recent_task_completions, 1);
        assert_eq!(ctx.recent_task_abandons, 1);
        assert_eq!(ctx.total_tasks_completed, 2);
        assert!(ctx.struggling_areas.is_empty());
    }

    #[test]
    fn test_struggles_when_abandons_outnumber_completions() {
        let now = at(9);
        let tasks = vec![
            task("a", TaskStatus::Pending, Duration::days(3), now),
            task("b", TaskStatus::Pending, Duration::days(4), now),
        ];
        let ctx = build_context(&UserProfile::new("u"), &tasks, now);
        assert!(ctx.is_struggling_with(STRUGGLE_TASK_COMPLETION));
    }

    #[test]
    fn test_consistent_completion_strength() {
        let now = at(9);
        let tasks: Vec<Task> = (0..6)
            .map(|i| task(&format!("t{}", i), TaskStatus::Completed, Duration::hours(i + 1), now))
            .collect();
        let ctx = build_context(&UserProfile::new("u"), &tasks, now);
        assert!(ctx.has_strength(STRENGTH_CONSISTENT_COMPLETION));
    }

    #[test]
    fn test_habits_split_into_struggles_and_strengths() {
        let mut profile = UserProfile::new("u");
        profile.habits = vec![
            habit("struggles with evening energy", 0.8),
            habit("completes tasks in the morning", 0.7),
            habit("struggles with mornings", 0.6),
            habit("walks after lunch", 0.3),
        ];
        let ctx = build_context(&profile, &[], at(9));
        assert_eq!(ctx.struggling_areas, vec!["struggles with evening energy"]);
        assert_eq!(ctx.strengths, vec!["completes tasks in the morning"]);
    }
}
