//! Document-store seam for the catalog.
//!
//! The selection path only needs two things from the store holding the
//! catalog: a random sample that honours an exclusion set, and point
//! lookups. Both are async because a real store sits behind the network.

use crate::error::Result;
use crate::index::CatalogIndex;
use crate::types::{Artwork, ArtworkId};
use async_trait::async_trait;
use std::collections::HashSet;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Draw one artwork uniformly at random, skipping `excluded`.
    ///
    /// `Ok(None)` means every artwork is excluded.
    async fn sample_excluding(&self, excluded: &HashSet<ArtworkId>) -> Result<Option<Artwork>>;

    /// Point lookup by native catalog id
    async fn find_by_id(&self, id: &str) -> Result<Option<Artwork>>;

    /// Point lookup by the key the recommendation worker uses
    async fn find_by_external_id(&self, key: &str) -> Result<Option<Artwork>>;

    /// Number of artworks in the catalog
    async fn count(&self) -> Result<usize>;
}

#[async_trait]
impl CatalogStore for CatalogIndex {
    async fn sample_excluding(&self, excluded: &HashSet<ArtworkId>) -> Result<Option<Artwork>> {
        let mut rng = rand::rng();
        Ok(CatalogIndex::sample_excluding(self, excluded, &mut rng).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Artwork>> {
        Ok(self.get(id).cloned())
    }

    async fn find_by_external_id(&self, key: &str) -> Result<Option<Artwork>> {
        Ok(self.get_by_external_id(key).cloned())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_index_as_store() {
        let mut index = CatalogIndex::new();
        index.insert(Artwork::new("a1", "One", "A", "u1").with_external_id("w1"));
        index.insert(Artwork::new("a2", "Two", "B", "u2"));
        let store: Arc<dyn CatalogStore> = Arc::new(index);

        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.find_by_id("a2").await.unwrap().unwrap().title, "Two");
        assert_eq!(store.find_by_external_id("w1").await.unwrap().unwrap().id, "a1");
        assert!(store.find_by_id("missing").await.unwrap().is_none());

        let excluded: HashSet<ArtworkId> = ["a1".to_string()].into_iter().collect();
        let sampled = store.sample_excluding(&excluded).await.unwrap().unwrap();
        assert_eq!(sampled.id, "a2");
    }
}
