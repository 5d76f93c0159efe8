//! Relevance scoring.
//!
//! Combines the following factors into a score in `[0, 1]`:
//! 1. Base score: 0.5
//! 2. Priority bonus: urgent +0.3, high +0.2, medium +0.1, low 0
//! 3. Preference alignment: average strength of matching-category
//!    preferences × 0.1
//! 4. Context bonuses for breathing, task and timing recommendations
//!
//! Scores are assigned once, when a candidate is generated.

use super::context::{
    RecommendationContext, TimeOfDay, STRENGTH_CONSISTENT_COMPLETION, STRUGGLE_TASK_COMPLETION,
};
use super::{Recommendation, RecommendationType};
use crate::profile::UserProfile;

const BASE_SCORE: f64 = 0.5;

/// Preference alignment bonus (strength is on a 0-10 scale).
pub fn preference_alignment(candidate: &Recommendation, profile: &UserProfile) -> f64 {
    let Some(category) = candidate.category() else {
        return 0.0;
    };

    let strengths: Vec<f64> = profile
        .preferences_in(category)
        .map(|p| p.strength)
        .filter(|s| s.is_finite())
        .collect();
    if strengths.is_empty() {
        return 0.0;
    }

    let average = strengths.iter().sum::<f64>() / strengths.len() as f64;
    average * 0.1
}

/// Bonus for recommendation kinds that fit the current context.
pub fn context_bonus(candidate: &Recommendation, context: &RecommendationContext) -> f64 {
    match candidate.kind {
        RecommendationType::Breathing if context.is_struggling_with(STRUGGLE_TASK_COMPLETION) => {
            0.15
        }
        RecommendationType::Task if context.has_strength(STRENGTH_CONSISTENT_COMPLETION) => 0.10,
        RecommendationType::Timing if context.time_of_day == TimeOfDay::Evening => 0.10,
        _ => 0.0,
    }
}

/// Calculate the relevance score of a candidate, clamped to `[0, 1]`.
pub fn score(
    candidate: &Recommendation,
    context: &RecommendationContext,
    profile: &UserProfile,
) -> f64 {
    let mut score = BASE_SCORE;

    score += candidate.priority.bonus();
    score += preference_alignment(candidate, profile);
    score += context_bonus(candidate, context);

    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::UserPreference;
    use crate::recommendation::context::build_context;
    use crate::recommendation::ids::{Minter, SequentialIds};
    use crate::recommendation::RecommendationPriority;
    use chrono::Utc;
    use proptest::prelude::*;

    fn candidate(kind: RecommendationType, priority: RecommendationPriority) -> Recommendation {
        let ids = SequentialIds::new();
        Minter::new(Utc::now(), &ids).mint(kind, priority, "t", "d", "r")
    }

    fn ctx() -> RecommendationContext {
        build_context(&UserProfile::new("u"), &[], Utc::now().fixed_offset())
    }

    fn pref(category: &str, strength: f64) -> UserPreference {
        UserPreference {
            category: category.to_string(),
            preference: "p".to_string(),
            strength,
            learned_at: Utc::now(),
            last_reinforced: Utc::now(),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_priority_bonus() {
        let profile = UserProfile::new("u");
        let ctx = ctx();
        let cases = [
            (RecommendationPriority::Low, 0.5),
            (RecommendationPriority::Medium, 0.6),
            (RecommendationPriority::High, 0.7),
            (RecommendationPriority::Urgent, 0.8),
        ];
        for (priority, expected) in cases {
            let rec = candidate(RecommendationType::Habit, priority);
            assert!(approx(score(&rec, &ctx, &profile), expected));
        }
    }

    #[test]
    fn test_preference_alignment_averages_matching_category() {
        let mut profile = UserProfile::new("u");
        profile.preferences = vec![pref("wellness", 2.0), pref("wellness", 4.0), pref("general", 10.0)];
        let rec = candidate(RecommendationType::Wellness, RecommendationPriority::Low)
            .with_category("wellness");
        assert!(approx(preference_alignment(&rec, &profile), 0.3));
        assert!(approx(score(&rec, &ctx(), &profile), 0.8));

        let uncategorized = candidate(RecommendationType::Wellness, RecommendationPriority::Low);
        assert_eq!(preference_alignment(&uncategorized, &profile), 0.0);
    }

    #[test]
    fn test_context_bonuses() {
        let mut ctx = ctx();
        let breathing = candidate(RecommendationType::Breathing, RecommendationPriority::Low);
        let task = candidate(RecommendationType::Task, RecommendationPriority::Low);
        let timing = candidate(RecommendationType::Timing, RecommendationPriority::Low);

        ctx.time_of_day = TimeOfDay::Afternoon;
        assert_eq!(context_bonus(&breathing, &ctx), 0.0);
        assert_eq!(context_bonus(&task, &ctx), 0.0);
        assert_eq!(context_bonus(&timing, &ctx), 0.0);

        ctx.struggling_areas.push(STRUGGLE_TASK_COMPLETION.to_string());
        ctx.strengths.push(STRENGTH_CONSISTENT_COMPLETION.to_string());
        ctx.time_of_day = TimeOfDay::Evening;
        assert_eq!(context_bonus(&breathing, &ctx), 0.15);
        assert_eq!(context_bonus(&task, &ctx), 0.10);
        assert_eq!(context_bonus(&timing, &ctx), 0.10);
    }

    #[test]
    fn test_score_is_clamped() {
        let mut profile = UserProfile::new("u");
        profile.preferences = vec![pref("productivity", 10.0)];
        let mut ctx = ctx();
        ctx.strengths.push(STRENGTH_CONSISTENT_COMPLETION.to_string());
        let rec = candidate(RecommendationType::Task, RecommendationPriority::Urgent)
            .with_category("productivity");
        assert_eq!(score(&rec, &ctx, &profile), 1.0);
    }

    #[test]
    fn test_non_finite_strengths_are_ignored() {
        let rec = candidate(RecommendationType::Wellness, RecommendationPriority::Low)
            .with_category("wellness");

        let mut profile = UserProfile::new("u");
        profile.preferences = vec![pref("wellness", f64::NAN)];
        assert_eq!(preference_alignment(&rec, &profile), 0.0);
        assert!(approx(score(&rec, &ctx(), &profile), 0.5));

        profile.preferences = vec![
            pref("wellness", f64::NAN),
            pref("wellness", f64::INFINITY),
            pref("wellness", 4.0),
        ];
        assert!(approx(score(&rec, &ctx(), &profile), 0.9));
    }

    proptest! {
        #[test]
        fn prop_score_within_bounds(
            strengths in proptest::collection::vec(0.0f64..=10.0, 0..6),
            priority in 0usize..4,
            kind in 0usize..7,
            struggling in any::<bool>(),
            strong in any::<bool>(),
        ) {
            let priorities = [
                RecommendationPriority::Low,
                RecommendationPriority::Medium,
                RecommendationPriority::High,
                RecommendationPriority::Urgent,
            ];
            let kinds = [
                RecommendationType::Task,
                RecommendationType::Wellness,
                RecommendationType::Breathing,
                RecommendationType::Feature,
                RecommendationType::Resource,
                RecommendationType::Habit,
                RecommendationType::Timing,
            ];
            let mut profile = UserProfile::new("u");
            profile.preferences = strengths.iter().map(|s| pref("cat", *s)).collect();
            let mut ctx = ctx();
            if struggling {
                ctx.struggling_areas.push(STRUGGLE_TASK_COMPLETION.to_string());
            }
            if strong {
                ctx.strengths.push(STRENGTH_CONSISTENT_COMPLETION.to_string());
            }
            let rec = candidate(kinds[kind], priorities[priority]).with_category("cat");
            let s = score(&rec, &ctx, &profile);
            prop_assert!((0.0..=1.0).contains(&s));
        }
    }
}
