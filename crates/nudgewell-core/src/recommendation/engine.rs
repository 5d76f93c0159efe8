//! Refresh orchestration and the public command surface.
//!
//! The engine is an explicit service object: build it once at startup and
//! share it (`Arc<RecommendationEngine>`) with whatever consumes it. All
//! mutations go through one async mutex, so a refresh never interleaves
//! with another refresh or with a dismiss on the same store.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use super::context::{build_context, RecommendationContext};
use super::ids::{Clock, IdGenerator, Minter, RandomIds, SystemClock};
use super::rules::generate_all;
use super::scoring::score;
use super::store::{MergeSummary, RecommendationStore};
use super::Recommendation;
use crate::error::Result;
use crate::profile::UserProfile;
use crate::storage::{KeyValueStore, RecommendationsConfig};
use crate::task::Task;

/// Result of a refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// No profile was available; nothing was generated
    NoProfile,
    /// Auto-refresh skipped because recommendations already exist or
    /// there are no tasks yet
    Skipped,
    /// Candidates were generated, scored and merged
    Refreshed {
        context: RecommendationContext,
        generated: usize,
        merge: MergeSummary,
    },
}

/// Personalized recommendation service.
pub struct RecommendationEngine {
    store: Mutex<RecommendationStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl RecommendationEngine {
    /// Create an engine on `backend` using the system clock and random ids.
    pub async fn new(backend: Arc<dyn KeyValueStore>, caps: &RecommendationsConfig) -> Self {
        Self::with_sources(backend, caps, Arc::new(SystemClock), Arc::new(RandomIds)).await
    }

    /// Create an engine with injected clock and id sources.
    pub async fn with_sources(
        backend: Arc<dyn KeyValueStore>,
        caps: &RecommendationsConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            store: Mutex::new(RecommendationStore::load(backend, caps).await),
            clock,
            ids,
        }
    }

    /// Up to the configured number of active recommendations, best first.
    pub async fn active_recommendations(&self) -> Vec<Recommendation> {
        let now = self.clock.now().with_timezone(&Utc);
        self.store.lock().await.active_view(now)
    }

    /// Every stored recommendation, including dismissed and completed ones.
    pub async fn recommendations(&self) -> Vec<Recommendation> {
        self.store.lock().await.recommendations().to_vec()
    }

    pub async fn dismissed_ids(&self) -> Vec<String> {
        self.store.lock().await.dismissed_ids().to_vec()
    }

    /// Regenerate and merge, regardless of what is already stored.
    ///
    /// An absent profile makes this a no-op. A profile with out-of-range
    /// strengths or confidences is rejected before anything is generated.
    pub async fn refresh(
        &self,
        profile: Option<&UserProfile>,
        tasks: &[Task],
    ) -> Result<RefreshOutcome> {
        let mut store = self.store.lock().await;
        self.refresh_locked(&mut store, profile, tasks).await
    }

    /// First-population policy: refresh only when a profile is present,
    /// tasks exist and nothing has been stored yet.
    pub async fn auto_refresh(
        &self,
        profile: Option<&UserProfile>,
        tasks: &[Task],
    ) -> Result<RefreshOutcome> {
        let mut store = self.store.lock().await;
        if profile.is_none() {
            return Ok(RefreshOutcome::NoProfile);
        }
        if tasks.is_empty() || !store.is_empty() {
            return Ok(RefreshOutcome::Skipped);
        }
        self.refresh_locked(&mut store, profile, tasks).await
    }

    async fn refresh_locked(
        &self,
        store: &mut RecommendationStore,
        profile: Option<&UserProfile>,
        tasks: &[Task],
    ) -> Result<RefreshOutcome> {
        let Some(profile) = profile else {
            tracing::debug!("Skipping recommendation refresh: no profile yet");
            return Ok(RefreshOutcome::NoProfile);
        };
        profile.validate()?;

        let now = self.clock.now();
        let now_utc = now.with_timezone(&Utc);
        let context = build_context(profile, tasks, now);
        let minter = Minter::new(now_utc, self.ids.as_ref());

        let candidates: Vec<Recommendation> = generate_all(profile, tasks, &context, &minter)
            .into_iter()
            .map(|mut candidate| {
                candidate.relevance_score = score(&candidate, &context, profile);
                candidate
            })
            .collect();
        let generated = candidates.len();

        let merge = store.merge(candidates, now_utc).await?;
        tracing::debug!(
            "Refreshed recommendations ({}): generated={} added={} duplicates={} expired={} evicted={}",
            context.time_of_day.name(),
            generated,
            merge.added,
            merge.duplicates,
            merge.expired,
            merge.evicted
        );

        Ok(RefreshOutcome::Refreshed {
            context,
            generated,
            merge,
        })
    }

    /// Dismiss a recommendation permanently (until `clear_dismissed`).
    pub async fn dismiss(&self, id: &str) -> Result<()> {
        self.store.lock().await.dismiss(id).await?;
        tracing::info!("Dismissed recommendation {}", id);
        Ok(())
    }

    /// Mark a recommendation as acted upon.
    pub async fn complete(&self, id: &str) -> Result<()> {
        self.store.lock().await.complete(id).await?;
        tracing::info!("Completed recommendation {}", id);
        Ok(())
    }

    /// Forget every dismissed id.
    pub async fn clear_dismissed(&self) -> Result<()> {
        self.store.lock().await.clear_dismissed().await?;
        tracing::info!("Cleared dismissed recommendations");
        Ok(())
    }
}
