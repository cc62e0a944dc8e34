//! Enrichment for recommended candidates.
//!
//! The worker and the catalog keep separate identifier spaces. A worker
//! candidate may carry the catalog id directly, may be keyed by the
//! catalog id itself, or may only know the worker-side key recorded on
//! the artwork as `external_id`. All translation between the two spaces
//! goes through [`Enricher::resolve_artwork`].

use catalog::{Artwork, CatalogStore};
use serde::Serialize;
use sources::{Candidate, CandidateSource};
use std::sync::Arc;
use tracing::{debug, instrument};

/// An artwork ready to be shown, with the path that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedArtwork {
    #[serde(flatten)]
    pub artwork: Artwork,
    pub source: CandidateSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl EnrichedArtwork {
    /// Wrap an artwork drawn straight from the catalog
    pub fn from_catalog(artwork: Artwork) -> Self {
        Self {
            artwork,
            source: CandidateSource::Random,
            score: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.artwork.id
    }
}

#[derive(Clone)]
pub struct Enricher {
    catalog: Arc<dyn CatalogStore>,
}

impl Enricher {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    /// Find the catalog artwork a candidate refers to.
    ///
    /// ## Algorithm
    /// 1. The candidate's catalog key, if the worker supplied one
    /// 2. The candidate's key as a catalog id
    /// 3. The candidate's key as a worker-side `external_id`
    ///
    /// `Ok(None)` means the candidate is unknown to the catalog.
    pub async fn resolve_artwork(&self, candidate: &Candidate) -> catalog::Result<Option<Artwork>> {
        if let Some(catalog_key) = &candidate.catalog_key {
            if let Some(artwork) = self.catalog.find_by_id(catalog_key).await? {
                return Ok(Some(artwork));
            }
        }
        if let Some(artwork) = self.catalog.find_by_id(&candidate.key).await? {
            return Ok(Some(artwork));
        }
        self.catalog.find_by_external_id(&candidate.key).await
    }

    /// Resolve candidates in order, dropping the ones the catalog does not know
    #[instrument(skip(self, candidates), fields(count = candidates.len()))]
    pub async fn enrich(&self, candidates: Vec<Candidate>) -> catalog::Result<Vec<EnrichedArtwork>> {
        let mut enriched = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match self.resolve_artwork(&candidate).await? {
                Some(artwork) => enriched.push(EnrichedArtwork {
                    artwork,
                    source: candidate.source,
                    score: Some(candidate.score),
                }),
                None => debug!("Dropping unresolvable candidate {}", candidate.key),
            }
        }
        Ok(enriched)
    }

    /// Resolve only as far as the first candidate the catalog knows
    pub async fn enrich_first(&self, candidates: Vec<Candidate>) -> catalog::Result<Option<EnrichedArtwork>> {
        for candidate in candidates {
            if let Some(artwork) = self.resolve_artwork(&candidate).await? {
                return Ok(Some(EnrichedArtwork {
                    artwork,
                    source: candidate.source,
                    score: Some(candidate.score),
                }));
            }
            debug!("Dropping unresolvable candidate {}", candidate.key);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::CatalogIndex;
    use serde_json::json;

    fn enricher() -> Enricher {
        let artworks = vec![
            Artwork::new("65a1", "Water Lilies", "Claude Monet", "https://img/65a1.jpg")
                .with_external_id("17"),
            Artwork::new("65a2", "The Starry Night", "Vincent van Gogh", "https://img/65a2.jpg"),
        ];
        Enricher::new(Arc::new(CatalogIndex::from_artworks(artworks).unwrap()))
    }

    #[tokio::test]
    async fn test_resolve_through_each_identifier_space() {
        let enricher = enricher();

        let by_catalog_key = Candidate::new("chroma-9", CandidateSource::Recommendation, 0.9)
            .with_catalog_key("65a2");
        let by_id = Candidate::new("65a2", CandidateSource::Recommendation, 0.8);
        let by_external = Candidate::new("17", CandidateSource::Recommendation, 0.7);

        for (candidate, expected) in [(by_catalog_key, "65a2"), (by_id, "65a2"), (by_external, "65a1")] {
            let artwork = enricher.resolve_artwork(&candidate).await.unwrap().unwrap();
            assert_eq!(artwork.id, expected);
        }
    }

    #[tokio::test]
    async fn test_unresolvable_candidates_are_dropped() {
        let enricher = enricher();
        let candidates = vec![
            Candidate::new("missing", CandidateSource::Recommendation, 0.9),
            Candidate::new("17", CandidateSource::Recommendation, 0.5),
        ];

        let enriched = enricher.enrich(candidates.clone()).await.unwrap();
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].id(), "65a1");
        assert_eq!(enriched[0].score, Some(0.5));

        let first = enricher.enrich_first(candidates).await.unwrap().unwrap();
        assert_eq!(first.id(), "65a1");

        let none = enricher
            .enrich_first(vec![Candidate::new("gone", CandidateSource::Recommendation, 0.1)])
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_enriched_artwork_serializes_flat() {
        let enriched = EnrichedArtwork::from_catalog(Artwork::new("65a2", "The Starry Night", "Vincent van Gogh", "https://img/65a2.jpg"));
        let value = serde_json::to_value(&enriched).unwrap();

        assert_eq!(value["_id"], json!("65a2"));
        assert_eq!(value["title"], json!("The Starry Night"));
        assert_eq!(value["source"], json!("random"));
        assert!(value.get("score").is_none());
    }
}
