//! Personalized recommendation engine.
//!
//! Suggestions are produced in one direction only:
//!
//! ```text
//! profile + tasks -> context -> candidates -> scored candidates
//!                 -> merged/persisted list -> active view
//! ```
//!
//! - [`context`] derives the situational snapshot for one cycle
//! - [`rules`] holds the five independent rule generators
//! - [`scoring`] assigns each candidate a relevance score in `[0, 1]`
//! - [`store`] persists the list and the dismissed skip-list
//! - [`engine`] orchestrates refreshes and exposes the command surface

pub mod context;
pub mod engine;
pub mod ids;
pub mod rules;
pub mod scoring;
pub mod store;

pub use context::{build_context, RecommendationContext, TimeOfDay};
pub use engine::{RecommendationEngine, RefreshOutcome};
pub use ids::{Clock, FixedClock, IdGenerator, Minter, RandomIds, SequentialIds, SystemClock};
pub use rules::{
    generate_all, generate_feature, generate_habit, generate_resource, generate_task,
    generate_wellness,
};
pub use scoring::score;
pub use store::RecommendationStore;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of recommendation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationType {
    Task,
    Wellness,
    Breathing,
    Feature,
    Resource,
    Habit,
    /// Time-sensitive nudges; scored with an evening bonus
    Timing,
}

/// Display priority of a recommendation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl RecommendationPriority {
    /// Score bonus contributed by this priority.
    pub fn bonus(self) -> f64 {
        match self {
            RecommendationPriority::Urgent => 0.3,
            RecommendationPriority::High => 0.2,
            RecommendationPriority::Medium => 0.1,
            RecommendationPriority::Low => 0.0,
        }
    }
}

/// A persisted suggestion with an optional call to action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub title: String,
    pub description: String,
    pub priority: RecommendationPriority,
    /// Human-readable justification
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_route: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// 0.0 until scored
    #[serde(default)]
    pub relevance_score: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dismissed: bool,
    #[serde(default)]
    pub completed: bool,
}

impl Recommendation {
    /// Category used for preference alignment, taken from `metadata.category`.
    pub fn category(&self) -> Option<&str> {
        self.metadata.get("category").and_then(Value::as_str)
    }

    /// True once `expires_at` is at or before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn with_action(mut self, label: &str, route: &str) -> Self {
        self.action_label = Some(label.to_string());
        self.action_route = Some(route.to_string());
        self
    }

    pub fn with_category(self, category: &str) -> Self {
        self.with_metadata("category", Value::from(category))
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Expire `ttl` after creation.
    pub fn expires_after(mut self, ttl: Duration) -> Self {
        self.expires_at = Some(self.created_at + ttl);
        self
    }
}
