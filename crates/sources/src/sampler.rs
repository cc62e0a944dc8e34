//! Catalog Sampler - the random path
//!
//! Draws one artwork uniformly at random from the catalog, skipping
//! everything in the viewer's sampling exclusions.
//!
//! ## Algorithm
//! 1. Union the viewer's shown and liked artworks
//! 2. Ask the catalog store for a uniform draw outside that union
//! 3. `None` means the catalog is exhausted for this viewer

use crate::types::ViewerContext;
use catalog::{Artwork, ArtworkId, CatalogStore};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct CatalogSampler {
    catalog: Arc<dyn CatalogStore>,
}

impl CatalogSampler {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    /// Sample for a viewer
    #[instrument(skip(self, context), fields(user_id = %context.user_id))]
    pub async fn sample(&self, context: &ViewerContext) -> catalog::Result<Option<Artwork>> {
        let excluded = context.sampling_exclusions();
        self.sample_excluding(&excluded).await
    }

    /// Sample outside an explicit exclusion set
    pub async fn sample_excluding(
        &self,
        excluded: &HashSet<ArtworkId>,
    ) -> catalog::Result<Option<Artwork>> {
        let sampled = self.catalog.sample_excluding(excluded).await?;
        match &sampled {
            Some(artwork) => debug!("Sampled {} ({} excluded)", artwork.id, excluded.len()),
            None => debug!("No artwork left outside {} exclusions", excluded.len()),
        }
        Ok(sampled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::CatalogIndex;

    fn catalog(ids: &[&str]) -> Arc<dyn CatalogStore> {
        let artworks = ids
            .iter()
            .map(|id| Artwork::new(*id, format!("Title {id}"), "Artist", format!("https://img/{id}.jpg")))
            .collect();
        Arc::new(CatalogIndex::from_artworks(artworks).unwrap())
    }

    #[tokio::test]
    async fn test_sample_skips_shown_and_liked() {
        let sampler = CatalogSampler::new(catalog(&["A1", "A2", "A3"]));
        let context = ViewerContext::new("u1")
            .with_liked(["A1"])
            .with_excluded(["A2"]);

        for _ in 0..50 {
            let artwork = sampler.sample(&context).await.unwrap().unwrap();
            assert_eq!(artwork.id, "A3");
        }
    }

    #[tokio::test]
    async fn test_sample_reports_exhaustion() {
        let sampler = CatalogSampler::new(catalog(&["A1"]));
        let context = ViewerContext::new("u1").with_excluded(["A1"]);

        assert!(sampler.sample(&context).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sample_covers_catalog() {
        let sampler = CatalogSampler::new(catalog(&["A1", "A2", "A3"]));
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let artwork = sampler.sample_excluding(&HashSet::new()).await.unwrap().unwrap();
            seen.insert(artwork.id);
        }
        assert_eq!(seen.len(), 3);
    }
}
