use crate::error::Result;
use async_trait::async_trait;
use catalog::{ArtworkId, UserId};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// Per-user set of artworks already shown.
///
/// Implementations must make `add` idempotent: adding a member twice
/// leaves one member.
#[async_trait]
pub trait ExclusionStore: Send + Sync {
    async fn add(&self, user_id: &str, artwork_id: &str) -> Result<()>;

    async fn members(&self, user_id: &str) -> Result<HashSet<ArtworkId>>;

    /// Forget everything the user has seen
    async fn clear(&self, user_id: &str) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Process-local store; contents are lost on restart
#[derive(Debug, Default)]
pub struct InMemoryExclusionStore {
    viewed: RwLock<HashMap<UserId, HashSet<ArtworkId>>>,
}

impl InMemoryExclusionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExclusionStore for InMemoryExclusionStore {
    async fn add(&self, user_id: &str, artwork_id: &str) -> Result<()> {
        self.viewed
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .insert(artwork_id.to_string());
        Ok(())
    }

    async fn members(&self, user_id: &str) -> Result<HashSet<ArtworkId>> {
        Ok(self
            .viewed
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn clear(&self, user_id: &str) -> Result<()> {
        self.viewed.write().await.remove(user_id);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let store = InMemoryExclusionStore::new();
        store.add("u1", "a1").await.unwrap();
        store.add("u1", "a1").await.unwrap();

        let members = store.members("u1").await.unwrap();
        assert_eq!(members.len(), 1);
        assert!(members.contains("a1"));
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = InMemoryExclusionStore::new();
        store.add("u1", "a1").await.unwrap();

        assert!(store.members("u2").await.unwrap().is_empty());

        store.clear("u1").await.unwrap();
        assert!(store.members("u1").await.unwrap().is_empty());
    }
}
