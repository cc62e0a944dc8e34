//! # Exclusion Tracker
//!
//! Durable per-user record of the artworks a user has already been shown.
//!
//! The tracker wraps an [`ExclusionStore`] and degrades gracefully: a
//! failed write is logged as [`TrackerError::WriteFailed`] and swallowed,
//! and a failed read yields an empty set. Losing an entry only risks an
//! occasional repeat.

pub mod error;
pub mod redis_store;
pub mod store;

pub use error::{Result, TrackerError};
pub use redis_store::RedisExclusionStore;
pub use store::{ExclusionStore, InMemoryExclusionStore};

use catalog::ArtworkId;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct ExclusionTracker {
    store: Arc<dyn ExclusionStore>,
}

impl ExclusionTracker {
    pub fn new(store: Arc<dyn ExclusionStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryExclusionStore::new()))
    }

    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    /// Record that `user_id` has been shown `artwork_id`.
    ///
    /// Idempotent. Never fails from the caller's point of view.
    #[instrument(skip(self), fields(backend = self.store.name()))]
    pub async fn mark_viewed(&self, user_id: &str, artwork_id: &str) {
        match self.store.add(user_id, artwork_id).await {
            Ok(()) => debug!("Marked {} viewed", artwork_id),
            Err(e) => {
                let failure = TrackerError::WriteFailed {
                    user_id: user_id.to_string(),
                    artwork_id: artwork_id.to_string(),
                    reason: e.to_string(),
                };
                warn!("{}", failure);
            }
        }
    }

    /// Everything `user_id` has been shown so far
    #[instrument(skip(self), fields(backend = self.store.name()))]
    pub async fn get_excluded(&self, user_id: &str) -> HashSet<ArtworkId> {
        match self.store.members(user_id).await {
            Ok(excluded) => {
                debug!("User has {} excluded artworks", excluded.len());
                excluded
            }
            Err(e) => {
                warn!("Exclusion lookup failed, continuing without exclusions: {}", e);
                HashSet::new()
            }
        }
    }

    /// Forget everything `user_id` has been shown
    pub async fn reset(&self, user_id: &str) -> Result<()> {
        self.store.clear(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FailingStore;

    #[async_trait]
    impl ExclusionStore for FailingStore {
        async fn add(&self, _user_id: &str, _artwork_id: &str) -> Result<()> {
            Err(TrackerError::Unavailable("connection refused".into()))
        }

        async fn members(&self, _user_id: &str) -> Result<HashSet<ArtworkId>> {
            Err(TrackerError::Unavailable("connection refused".into()))
        }

        async fn clear(&self, _user_id: &str) -> Result<()> {
            Err(TrackerError::Unavailable("connection refused".into()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_mark_viewed_twice_leaves_one_entry() {
        let tracker = ExclusionTracker::in_memory();

        tracker.mark_viewed("u1", "a1").await;
        tracker.mark_viewed("u1", "a1").await;

        let excluded = tracker.get_excluded("u1").await;
        assert_eq!(excluded.len(), 1);
        assert!(excluded.contains("a1"));
    }

    #[tokio::test]
    async fn test_store_failures_are_swallowed() {
        let tracker = ExclusionTracker::new(Arc::new(FailingStore));

        tracker.mark_viewed("u1", "a1").await;
        assert!(tracker.get_excluded("u1").await.is_empty());
        assert!(tracker.reset("u1").await.is_err());
    }

    #[tokio::test]
    async fn test_reset_clears_only_that_user() {
        let tracker = ExclusionTracker::in_memory();
        tracker.mark_viewed("u1", "a1").await;
        tracker.mark_viewed("u2", "a1").await;

        tracker.reset("u1").await.unwrap();

        assert!(tracker.get_excluded("u1").await.is_empty());
        assert_eq!(tracker.get_excluded("u2").await.len(), 1);
    }
}
