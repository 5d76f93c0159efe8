//! Rule generators.
//!
//! Each generator is a pure function of `(profile, tasks, context)` that
//! yields zero or more unscored candidates. The [`Minter`] only stamps ids
//! and `createdAt`; everything else is decided by the trigger conditions
//! below. Missing optional profile fields mean the rule does not fire.

use chrono::Duration;
use serde_json::Value;

use super::context::{RecommendationContext, TimeOfDay, STRUGGLE_TASK_COMPLETION};
use super::ids::Minter;
use super::{Recommendation, RecommendationPriority as Priority, RecommendationType as Kind};
use crate::profile::{PatientType, UserProfile, UserRole};
use crate::task::{Task, TaskPriority};

/// Route of the AI coach screen.
pub const AI_COACH_ROUTE: &str = "/nexa";

/// `metadata.source` value marking an interaction with the AI coach.
const AI_COACH_SOURCE: &str = "nexa";

/// Signature shared by all generators.
pub type RuleGenerator =
    fn(&UserProfile, &[Task], &RecommendationContext, &Minter<'_>) -> Vec<Recommendation>;

/// The full catalog, in evaluation order.
pub const GENERATORS: [(&str, RuleGenerator); 5] = [
    ("task", generate_task),
    ("wellness", generate_wellness),
    ("feature", generate_feature),
    ("resource", generate_resource),
    ("habit", generate_habit),
];

/// Run every generator and concatenate their candidates.
pub fn generate_all(
    profile: &UserProfile,
    tasks: &[Task],
    context: &RecommendationContext,
    minter: &Minter<'_>,
) -> Vec<Recommendation> {
    GENERATORS
        .iter()
        .flat_map(|(_, generate)| generate(profile, tasks, context, minter))
        .collect()
}

/// Task nudges: getting started, splitting work up, high priority first.
pub fn generate_task(
    _profile: &UserProfile,
    tasks: &[Task],
    context: &RecommendationContext,
    minter: &Minter<'_>,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if context.recent_task_completions == 0 && !tasks.is_empty() {
        out.push(
            minter
                .mint(
                    Kind::Task,
                    Priority::High,
                    "Start Your Day Right",
                    "Pick one small task and finish it. A single win makes the next one easier.",
                    "You haven't completed any tasks this week yet",
                )
                .with_action("View Tasks", "/tasks")
                .with_category("productivity")
                .expires_after(Duration::hours(12)),
        );
    }

    if context.recent_task_abandons > 3 {
        out.push(
            minter
                .mint(
                    Kind::Task,
                    Priority::High,
                    "Break It Down",
                    "Some tasks have been waiting a while. Let the AI coach split one into smaller steps.",
                    "Several tasks have been left unfinished",
                )
                .with_action("Ask the Coach", AI_COACH_ROUTE)
                .with_category("productivity")
                .with_metadata("abandoned", Value::from(context.recent_task_abandons)),
        );
    }

    let high_pending = tasks
        .iter()
        .filter(|t| t.is_pending() && t.priority == TaskPriority::High)
        .count();
    if high_pending > 0 && context.time_of_day == TimeOfDay::Morning {
        let noun = if high_pending == 1 { "task" } else { "tasks" };
        out.push(
            minter
                .mint(
                    Kind::Task,
                    Priority::Medium,
                    "Tackle High Priority Tasks",
                    format!(
                        "You have {} high priority {} waiting. Mornings are a good time to start them.",
                        high_pending, noun
                    ),
                    "Energy is usually highest in the morning",
                )
                .with_action("View Tasks", "/tasks")
                .with_category("productivity")
                .with_metadata("count", Value::from(high_pending))
                .expires_after(Duration::hours(6)),
        );
    }

    out
}

/// Wellness nudges: breathing, winding down, favorite exercises.
pub fn generate_wellness(
    profile: &UserProfile,
    _tasks: &[Task],
    context: &RecommendationContext,
    minter: &Minter<'_>,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if context.is_struggling_with(STRUGGLE_TASK_COMPLETION) || context.recent_task_abandons > 2 {
        out.push(
            minter
                .mint(
                    Kind::Breathing,
                    Priority::Medium,
                    "Take a Breathing Break",
                    "A two-minute breathing exercise can make the next step feel lighter.",
                    "Tasks have been piling up recently",
                )
                .with_action("Start Breathing", "/wellness/breathing")
                .with_category("wellness")
                .expires_after(Duration::hours(2)),
        );
    }

    if context.time_of_day == TimeOfDay::Evening && context.recent_task_completions > 3 {
        out.push(
            minter
                .mint(
                    Kind::Wellness,
                    Priority::Low,
                    "Wind Down for the Evening",
                    "You've done a lot this week. Take some quiet time before bed.",
                    "You completed several tasks recently",
                )
                .with_action("Relax", "/wellness")
                .with_category("wellness")
                .expires_after(Duration::hours(4)),
        );
    }

    let favorite = profile
        .preferences_in("general")
        .find(|p| p.preference.contains("breathing") && p.strength > 5.0);
    if let Some(pref) = favorite {
        out.push(
            minter
                .mint(
                    Kind::Breathing,
                    Priority::Low,
                    "Your Favorite Breathing Exercise",
                    "Your go-to breathing exercise is ready whenever you want it.",
                    "You often choose breathing exercises",
                )
                .with_action("Breathe", "/wellness/breathing")
                .with_category("general")
                .with_metadata("preference", Value::from(pref.preference.as_str())),
        );
    }

    out
}

/// Feature discovery: AI coach, progress view, personalization.
pub fn generate_feature(
    profile: &UserProfile,
    _tasks: &[Task],
    context: &RecommendationContext,
    minter: &Minter<'_>,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    let used_coach = profile
        .interactions
        .iter()
        .any(|i| i.metadata_str("source") == Some(AI_COACH_SOURCE));
    if !used_coach && context.total_tasks_completed > 2 {
        out.push(
            minter
                .mint(
                    Kind::Feature,
                    Priority::High,
                    "Meet Your AI Coach",
                    "The AI coach can help plan your day and break big tasks into small steps.",
                    "You're building momentum and haven't tried the coach yet",
                )
                .with_action("Try the Coach", AI_COACH_ROUTE)
                .with_category("features"),
        );
    }

    if profile.is_patient_of(PatientType::Cognitive) && context.total_tasks_completed > 5 {
        out.push(
            minter
                .mint(
                    Kind::Feature,
                    Priority::Low,
                    "See Your Progress",
                    "Look back at everything you've finished so far.",
                    "You've completed more than five tasks",
                )
                .with_action("View Progress", "/progress")
                .with_category("features"),
        );
    }

    let supported_patient = profile.is_patient_of(PatientType::Cognitive)
        || profile.is_patient_of(PatientType::Memory);
    if supported_patient && profile.preferences_in("communication").next().is_none() {
        out.push(
            minter
                .mint(
                    Kind::Feature,
                    Priority::Medium,
                    "Personalize Your Experience",
                    "Choose how reminders sound and how much detail you see.",
                    "Your communication preferences aren't set yet",
                )
                .with_action("Open Settings", "/settings")
                .with_category("communication"),
        );
    }

    out
}

/// Support resources once several struggles pile up.
pub fn generate_resource(
    profile: &UserProfile,
    _tasks: &[Task],
    context: &RecommendationContext,
    minter: &Minter<'_>,
) -> Vec<Recommendation> {
    if context.struggling_areas.len() <= 2 {
        return Vec::new();
    }

    let description = match (profile.role, profile.patient_type) {
        (UserRole::Caregiver, _) => {
            "Caring for someone is demanding. Find caregiver guides and support groups."
        }
        (UserRole::Patient, Some(PatientType::Cognitive)) => {
            "Find tools and strategies for staying focused and organized."
        }
        (UserRole::Patient, Some(PatientType::Memory)) => {
            "Find memory aids and tips for building reliable routines."
        }
        _ => "Find helpful resources and support for the challenges you're facing.",
    };

    vec![minter
        .mint(
            Kind::Resource,
            Priority::Medium,
            "Support Resources",
            description,
            "A few areas have been challenging lately",
        )
        .with_action("Explore Resources", "/resources")
        .with_category("support")
        .with_metadata("areas", Value::from(context.struggling_areas.len()))]
}

/// Habit reinforcement for observed routines.
pub fn generate_habit(
    profile: &UserProfile,
    _tasks: &[Task],
    context: &RecommendationContext,
    minter: &Minter<'_>,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    let morning_habit = profile
        .habits
        .iter()
        .any(|h| h.pattern.contains("morning") && h.confidence > 0.5);
    if morning_habit && context.time_of_day == TimeOfDay::Morning {
        out.push(
            minter
                .mint(
                    Kind::Habit,
                    Priority::Low,
                    "Keep Your Morning Routine",
                    "Mornings work well for you. Keep the streak going with your usual start.",
                    "You tend to get things done in the morning",
                )
                .with_action("View Tasks", "/tasks")
                .with_category("routine"),
        );
    }

    let evening_dip = profile
        .habits
        .iter()
        .any(|h| h.pattern.contains("evening") && h.pattern.contains("struggles"));
    if evening_dip && context.time_of_day == TimeOfDay::Evening {
        out.push(
            minter
                .mint(
                    Kind::Habit,
                    Priority::Low,
                    "Plan for Your Evening Dip",
                    "Evenings can be harder. Save lighter tasks for now and rest when you need to.",
                    "Energy tends to drop in the evening",
                )
                .with_category("routine"),
        );
    }

    out
}
