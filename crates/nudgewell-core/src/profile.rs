//! User profile snapshot and its learning operations.
//!
//! The recommendation engine reads profiles but never writes them. Preference
//! strength and habit confidence only move through the learning operations
//! defined here, which the profile subsystem calls as the user interacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Maximum number of interactions kept on a profile (most recent first).
pub const MAX_INTERACTIONS: usize = 100;

/// Upper bound of preference strength.
pub const MAX_PREFERENCE_STRENGTH: f64 = 10.0;

/// Confidence assigned to a habit the first time it is observed.
const INITIAL_HABIT_CONFIDENCE: f64 = 0.1;

/// Confidence gained each time a known habit is observed again.
const HABIT_CONFIDENCE_STEP: f64 = 0.1;

/// Who the profile belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Patient,
    Caregiver,
}

/// Kind of support a patient receives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatientType {
    Cognitive,
    Memory,
    #[serde(other)]
    Other,
}

/// How an interaction felt to the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

/// A learned preference, e.g. `general` / `breathing exercises`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPreference {
    pub category: String,
    pub preference: String,
    /// Strength on a 0-10 scale
    pub strength: f64,
    pub learned_at: DateTime<Utc>,
    pub last_reinforced: DateTime<Utc>,
}

/// A behavioral pattern observed over time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserHabit {
    /// Free-text pattern, e.g. "completes tasks in the morning"
    pub pattern: String,
    pub frequency: u32,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub last_observed: DateTime<Utc>,
}

/// A single recorded interaction with the app.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserInteraction {
    #[serde(rename = "type")]
    pub interaction_type: String,
    #[serde(default)]
    pub sentiment: Sentiment,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl UserInteraction {
    /// Read a string field from the interaction metadata.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// Behavioral profile of a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub preferences: Vec<UserPreference>,
    #[serde(default)]
    pub habits: Vec<UserHabit>,
    /// Most recent first, capped at [`MAX_INTERACTIONS`]
    #[serde(default)]
    pub interactions: Vec<UserInteraction>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub patient_type: Option<PatientType>,
}

impl UserProfile {
    /// Create an empty patient profile.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// True when the profile is a patient of the given kind.
    pub fn is_patient_of(&self, kind: PatientType) -> bool {
        self.role == UserRole::Patient && self.patient_type == Some(kind)
    }

    /// Preferences in `category`, in profile order.
    pub fn preferences_in<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a UserPreference> + 'a {
        self.preferences.iter().filter(move |p| p.category == category)
    }

    /// Record an interaction, keeping the newest [`MAX_INTERACTIONS`].
    pub fn record_interaction(&mut self, interaction: UserInteraction) {
        self.interactions.insert(0, interaction);
        self.interactions.truncate(MAX_INTERACTIONS);
    }

    /// Reinforce (or learn) a preference by `strength_delta`.
    ///
    /// Strength is clamped to `[0, 10]`.
    pub fn learn_preference(
        &mut self,
        category: &str,
        preference: &str,
        strength_delta: f64,
        now: DateTime<Utc>,
    ) {
        if let Some(existing) = self
            .preferences
            .iter_mut()
            .find(|p| p.category == category && p.preference == preference)
        {
            existing.strength =
                (existing.strength + strength_delta).clamp(0.0, MAX_PREFERENCE_STRENGTH);
            existing.last_reinforced = now;
            return;
        }

        self.preferences.push(UserPreference {
            category: category.to_string(),
            preference: preference.to_string(),
            strength: strength_delta.clamp(0.0, MAX_PREFERENCE_STRENGTH),
            learned_at: now,
            last_reinforced: now,
        });
    }

    /// Observe a behavioral pattern once more.
    pub fn observe_habit(&mut self, pattern: &str, now: DateTime<Utc>) {
        if let Some(habit) = self.habits.iter_mut().find(|h| h.pattern == pattern) {
            habit.frequency += 1;
            habit.confidence = (habit.confidence + HABIT_CONFIDENCE_STEP).min(1.0);
            habit.last_observed = now;
            return;
        }

        self.habits.push(UserHabit {
            pattern: pattern.to_string(),
            frequency: 1,
            confidence: INITIAL_HABIT_CONFIDENCE,
            last_observed: now,
        });
    }

    /// Check that strengths and confidences are inside their ranges.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(p) = self
            .preferences
            .iter()
            .find(|p| !(0.0..=MAX_PREFERENCE_STRENGTH).contains(&p.strength))
        {
            return Err(ValidationError::InvalidValue {
                field: format!("preferences[{}].strength", p.preference),
                message: format!("{} is outside 0-10", p.strength),
            });
        }
        if let Some(h) = self
            .habits
            .iter()
            .find(|h| !(0.0..=1.0).contains(&h.confidence))
        {
            return Err(ValidationError::InvalidValue {
                field: format!("habits[{}].confidence", h.pattern),
                message: format!("{} is outside 0-1", h.confidence),
            });
        }
        Ok(())
    }
}
