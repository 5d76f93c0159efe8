//! Recommendation persistence and lifecycle.
//!
//! Two lists are persisted under independent keys: the recommendations
//! themselves and the skip-list of dismissed ids. The in-memory copies are
//! only replaced after the corresponding write has succeeded.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Recommendation;
use crate::error::{CoreError, Result};
use crate::storage::{KeyValueStore, RecommendationsConfig};

/// Key holding the JSON array of recommendations.
pub const RECOMMENDATIONS_KEY: &str = "recommendations";

/// Key holding the JSON array of dismissed ids.
pub const DISMISSED_KEY: &str = "dismissed_recommendations";

/// What a merge changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    /// Candidates appended
    pub added: usize,
    /// Candidates skipped because their id was already stored
    pub duplicates: usize,
    /// Entries dropped because they had expired
    pub expired: usize,
    /// Entries evicted to respect the storage cap
    pub evicted: usize,
}

/// Persisted recommendations plus the dismissed skip-list.
pub struct RecommendationStore {
    backend: Arc<dyn KeyValueStore>,
    recommendations: Vec<Recommendation>,
    dismissed_ids: Vec<String>,
    max_stored: usize,
    max_active: usize,
}

impl RecommendationStore {
    /// Load both lists from `backend`.
    ///
    /// Unreadable or malformed data degrades to an empty list.
    pub async fn load(backend: Arc<dyn KeyValueStore>, caps: &RecommendationsConfig) -> Self {
        let recommendations = read_list(backend.as_ref(), RECOMMENDATIONS_KEY).await;
        let dismissed_ids = read_list(backend.as_ref(), DISMISSED_KEY).await;
        tracing::debug!(
            "Loaded {} recommendations and {} dismissed ids",
            recommendations.len(),
            dismissed_ids.len()
        );

        Self {
            backend,
            recommendations,
            dismissed_ids,
            max_stored: caps.max_stored,
            max_active: caps.max_active,
        }
    }

    /// All stored recommendations, oldest first.
    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    pub fn dismissed_ids(&self) -> &[String] {
        &self.dismissed_ids
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }

    fn is_dismissed(&self, id: &str) -> bool {
        self.dismissed_ids.iter().any(|d| d == id)
    }

    /// Merge scored candidates, prune expired entries, cap and persist.
    pub async fn merge(
        &mut self,
        candidates: Vec<Recommendation>,
        now: DateTime<Utc>,
    ) -> Result<MergeSummary> {
        let mut summary = MergeSummary::default();
        let mut seen: HashSet<String> = self.recommendations.iter().map(|r| r.id.clone()).collect();

        let mut merged = self.recommendations.clone();
        for candidate in candidates {
            if seen.insert(candidate.id.clone()) {
                merged.push(candidate);
                summary.added += 1;
            } else {
                summary.duplicates += 1;
            }
        }

        let before = merged.len();
        merged.retain(|r| !r.is_expired(now));
        summary.expired = before - merged.len();

        if merged.len() > self.max_stored {
            summary.evicted = merged.len() - self.max_stored;
            merged.drain(..summary.evicted);
        }

        write_list(self.backend.as_ref(), RECOMMENDATIONS_KEY, &merged).await?;
        self.recommendations = merged;
        Ok(summary)
    }

    /// Active recommendations, highest score first, capped.
    pub fn active_view(&self, now: DateTime<Utc>) -> Vec<Recommendation> {
        let mut active: Vec<Recommendation> = self
            .recommendations
            .iter()
            .filter(|r| !r.dismissed && !r.completed)
            .filter(|r| !r.is_expired(now))
            .filter(|r| !self.is_dismissed(&r.id))
            .cloned()
            .collect();

        active.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(Ordering::Equal)
        });
        active.truncate(self.max_active);
        active
    }

    /// Flag `id` dismissed and add it to the skip-list.
    ///
    /// The skip-list is written first. If the recommendations write then
    /// fails, the previous skip-list is written back.
    pub async fn dismiss(&mut self, id: &str) -> Result<()> {
        let recommendations = self.with_flag(id, |r| r.dismissed = true)?;
        let mut dismissed_ids = self.dismissed_ids.clone();
        if !dismissed_ids.iter().any(|d| d == id) {
            dismissed_ids.push(id.to_string());
        }

        write_list(self.backend.as_ref(), DISMISSED_KEY, &dismissed_ids).await?;
        if let Err(e) =
            write_list(self.backend.as_ref(), RECOMMENDATIONS_KEY, &recommendations).await
        {
            if let Err(rollback) =
                write_list(self.backend.as_ref(), DISMISSED_KEY, &self.dismissed_ids).await
            {
                tracing::warn!("Failed to restore dismissed ids after '{}': {}", id, rollback);
            }
            return Err(e);
        }
        self.recommendations = recommendations;
        self.dismissed_ids = dismissed_ids;
        Ok(())
    }

    /// Flag `id` completed. The skip-list is left alone.
    pub async fn complete(&mut self, id: &str) -> Result<()> {
        let recommendations = self.with_flag(id, |r| r.completed = true)?;
        write_list(self.backend.as_ref(), RECOMMENDATIONS_KEY, &recommendations).await?;
        self.recommendations = recommendations;
        Ok(())
    }

    /// Empty the skip-list. Flags already set on entries stay.
    pub async fn clear_dismissed(&mut self) -> Result<()> {
        write_list::<String>(self.backend.as_ref(), DISMISSED_KEY, &[]).await?;
        self.dismissed_ids.clear();
        Ok(())
    }

    fn with_flag(
        &self,
        id: &str,
        apply: impl FnOnce(&mut Recommendation),
    ) -> Result<Vec<Recommendation>> {
        let mut recommendations = self.recommendations.clone();
        let entry = recommendations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        apply(entry);
        Ok(recommendations)
    }
}

async fn read_list<T: DeserializeOwned>(backend: &dyn KeyValueStore, key: &str) -> Vec<T> {
    let raw = match backend.load(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!("Falling back to an empty list for '{}': {}", key, e);
            return Vec::new();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!("Ignoring malformed data under '{}': {}", key, e);
        Vec::new()
    })
}

async fn write_list<T: Serialize>(
    backend: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> Result<()> {
    let raw = serde_json::to_string(items)?;
    backend.save(key, &raw).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::ids::{Minter, SequentialIds};
    use crate::recommendation::{RecommendationPriority, RecommendationType};
    use crate::storage::MemoryStore;
    use chrono::Duration;
    use proptest::prelude::*;

    fn rec(id: &str, score: f64, now: DateTime<Utc>) -> Recommendation {
        let ids = SequentialIds::new();
        let mut r = Minter::new(now, &ids).mint(
            RecommendationType::Task,
            RecommendationPriority::Medium,
            id,
            "d",
            "r",
        );
        r.id = id.to_string();
        r.relevance_score = score;
        r
    }

    async fn store_with(backend: Arc<MemoryStore>) -> RecommendationStore {
        RecommendationStore::load(backend, &RecommendationsConfig::default()).await
    }

    #[tokio::test]
    async fn test_merge_dedups_by_id() {
        let now = Utc::now();
        let mut store = store_with(Arc::new(MemoryStore::new())).await;
        store.merge(vec![rec("a", 0.5, now), rec("b", 0.6, now)], now).await.unwrap();

        let mut changed = rec("a", 0.9, now);
        changed.title = "different content".to_string();
        let summary = store.merge(vec![changed, rec("c", 0.7, now)], now).await.unwrap();

        assert_eq!(summary.added, 1);
        assert_eq!(summary.duplicates, 1);
        let ids: Vec<&str> = store.recommendations().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(store.recommendations()[0].relevance_score, 0.5);
    }

    #[tokio::test]
    async fn test_merge_prunes_expired_and_caps_oldest_first() {
        let now = Utc::now();
        let mut store = store_with(Arc::new(MemoryStore::new())).await;

        let mut stale = rec("stale", 0.9, now - Duration::hours(3));
        stale.expires_at = Some(now - Duration::hours(1));
        store.merge(vec![stale], now - Duration::hours(2)).await.unwrap();
        assert_eq!(store.recommendations().len(), 1);

        let batch: Vec<Recommendation> = (0..25).map(|i| rec(&format!("r{}", i), 0.5, now)).collect();
        let summary = store.merge(batch, now).await.unwrap();

        assert_eq!(summary.expired, 1);
        assert_eq!(summary.evicted, 5);
        assert_eq!(store.recommendations().len(), 20);
        assert_eq!(store.recommendations()[0].id, "r5");
        assert_eq!(store.recommendations()[19].id, "r24");
    }

    #[tokio::test]
    async fn test_active_view_filters_sorts_and_caps() {
        let now = Utc::now();
        let mut store = store_with(Arc::new(MemoryStore::new())).await;
        let mut batch: Vec<Recommendation> =
            (0..8).map(|i| rec(&format!("r{}", i), 0.1 * i as f64, now)).collect();
        batch[7].completed = true;
        batch[6].expires_at = Some(now + Duration::minutes(5));
        store.merge(batch, now).await.unwrap();
        store.dismiss("r5").await.unwrap();

        let active = store.active_view(now);
        let ids: Vec<&str> = active.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r6", "r4", "r3", "r2", "r1"]);

        let later = store.active_view(now + Duration::minutes(10));
        assert_eq!(later[0].id, "r4");
    }

    #[tokio::test]
    async fn test_dismiss_persists_flag_and_skip_list() {
        let now = Utc::now();
        let backend = Arc::new(MemoryStore::new());
        let mut store = store_with(backend.clone()).await;
        store.merge(vec![rec("a", 0.5, now)], now).await.unwrap();
        store.dismiss("a").await.unwrap();
        store.dismiss("a").await.unwrap();

        let reloaded = store_with(backend).await;
        assert!(reloaded.recommendations()[0].dismissed);
        assert_eq!(reloaded.dismissed_ids(), &["a".to_string()]);
    }

    #[tokio::test]
    async fn test_dismiss_skip_list_write_failure_persists_nothing() {
        let now = Utc::now();
        let backend = Arc::new(MemoryStore::new());
        let mut store = store_with(backend.clone()).await;
        store.merge(vec![rec("a", 0.5, now)], now).await.unwrap();

        backend.set_fail_key(DISMISSED_KEY, true).await;
        assert!(matches!(store.dismiss("a").await, Err(CoreError::Storage(_))));
        assert!(!store.recommendations()[0].dismissed);

        let reloaded = store_with(backend).await;
        assert!(!reloaded.recommendations()[0].dismissed);
        assert!(reloaded.dismissed_ids().is_empty());
        assert_eq!(reloaded.active_view(now).len(), 1);
    }

    #[tokio::test]
    async fn test_dismiss_restores_skip_list_when_flag_write_fails() {
        let now = Utc::now();
        let backend = Arc::new(MemoryStore::new());
        let mut store = store_with(backend.clone()).await;
        store
            .merge(vec![rec("a", 0.5, now), rec("b", 0.6, now)], now)
            .await
            .unwrap();
        store.dismiss("a").await.unwrap();

        backend.set_fail_key(RECOMMENDATIONS_KEY, true).await;
        assert!(store.dismiss("b").await.is_err());
        assert_eq!(store.dismissed_ids(), &["a".to_string()]);

        let reloaded = store_with(backend).await;
        assert_eq!(reloaded.dismissed_ids(), &["a".to_string()]);
        assert!(!reloaded.recommendations()[1].dismissed);
        let active = reloaded.active_view(now);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "b");
    }

    #[tokio::test]
    async fn test_complete_leaves_skip_list_alone() {
        let now = Utc::now();
        let mut store = store_with(Arc::new(MemoryStore::new())).await;
        store.merge(vec![rec("a", 0.5, now)], now).await.unwrap();
        store.complete("a").await.unwrap();

        assert!(store.recommendations()[0].completed);
        assert!(store.dismissed_ids().is_empty());
        assert!(store.active_view(now).is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let mut store = store_with(Arc::new(MemoryStore::new())).await;
        assert!(matches!(store.dismiss("nope").await, Err(CoreError::NotFound(_))));
        assert!(matches!(store.complete("nope").await, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_clear_dismissed_keeps_flags() {
        let now = Utc::now();
        let mut store = store_with(Arc::new(MemoryStore::new())).await;
        store.merge(vec![rec("a", 0.5, now)], now).await.unwrap();
        store.dismiss("a").await.unwrap();
        store.clear_dismissed().await.unwrap();

        assert!(store.dismissed_ids().is_empty());
        assert!(store.recommendations()[0].dismissed);
        assert!(store.active_view(now).is_empty());
    }

    #[tokio::test]
    async fn test_malformed_data_loads_empty() {
        let backend = Arc::new(MemoryStore::new());
        backend.insert_raw(RECOMMENDATIONS_KEY, "{not json").await;
        backend.insert_raw(DISMISSED_KEY, "[\"x\"]").await;

        let store = store_with(backend).await;
        assert!(store.is_empty());
        assert_eq!(store.dismissed_ids(), &["x".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_memory_unchanged() {
        let now = Utc::now();
        let backend = Arc::new(MemoryStore::new());
        let mut store = store_with(backend.clone()).await;
        store.merge(vec![rec("a", 0.5, now)], now).await.unwrap();

        backend.set_fail_writes(true);
        assert!(store.merge(vec![rec("b", 0.5, now)], now).await.is_err());
        assert!(store.dismiss("a").await.is_err());
        assert!(store.complete("a").await.is_err());

        assert_eq!(store.recommendations().len(), 1);
        assert!(!store.recommendations()[0].dismissed);
        assert!(!store.recommendations()[0].completed);
        assert!(store.dismissed_ids().is_empty());
    }

    proptest! {
        #[test]
        fn prop_merge_never_duplicates_ids(batches in proptest::collection::vec(
            proptest::collection::vec(0u8..30, 0..12), 1..6)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let now = Utc::now();
                let mut store = store_with(Arc::new(MemoryStore::new())).await;
                for batch in batches {
                    let candidates = batch.iter().map(|n| rec(&format!("r{}", n), 0.5, now)).collect();
                    store.merge(candidates, now).await.unwrap();

                    let ids: HashSet<&str> = store.recommendations().iter().map(|r| r.id.as_str()).collect();
                    assert_eq!(ids.len(), store.recommendations().len());
                    assert!(store.recommendations().len() <= 20);
                    assert!(store.active_view(now).len() <= 5);
                }
            });
        }
    }
}
