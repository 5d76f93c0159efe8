//! Clock and id injection.
//!
//! Every generated recommendation gets a fresh id and a `createdAt` stamp.
//! Both come from injected sources so fixtures can freeze them.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, FixedOffset, Local, Utc};
use serde_json::Map;

use super::{Recommendation, RecommendationPriority, RecommendationType};

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// System local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    /// Freeze at a UTC instant (local offset +00:00).
    pub fn at_utc(instant: DateTime<Utc>) -> Self {
        Self(instant.fixed_offset())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Source of globally unique recommendation ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self, now: DateTime<Utc>) -> String;
}

/// Timestamp plus random suffix, e.g. `rec-1760688000000-3f2a9c1d`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self, now: DateTime<Utc>) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("rec-{}-{}", now.timestamp_millis(), &suffix[..8])
    }
}

/// Deterministic ids `rec-1`, `rec-2`, ...
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, _now: DateTime<Utc>) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("rec-{}", n)
    }
}

/// Stamps new candidates with an id and creation time for one cycle.
pub struct Minter<'a> {
    now: DateTime<Utc>,
    ids: &'a dyn IdGenerator,
}

impl<'a> Minter<'a> {
    pub fn new(now: DateTime<Utc>, ids: &'a dyn IdGenerator) -> Self {
        Self { now, ids }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Create an unscored candidate.
    pub fn mint(
        &self,
        kind: RecommendationType,
        priority: RecommendationPriority,
        title: &str,
        description: impl Into<String>,
        reason: &str,
    ) -> Recommendation {
        Recommendation {
            id: self.ids.next_id(self.now),
            kind,
            title: title.to_string(),
            description: description.into(),
            priority,
            reason: reason.to_string(),
            action_label: None,
            action_route: None,
            metadata: Map::new(),
            relevance_score: 0.0,
            created_at: self.now,
            expires_at: None,
            dismissed: false,
            completed: false,
        }
    }
}
