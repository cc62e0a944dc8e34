//! Integration tests for the pipeline.
//!
//! These tests verify that the viewer context, filters, and enrichment
//! work together in a realistic scenario.

use catalog::{Artwork, CatalogIndex, CatalogStore};
use pipeline::filters::*;
use pipeline::{Enricher, FilterPipeline};
use sources::{Candidate, CandidateSource, build_viewer_context};
use std::sync::Arc;
use tracker::ExclusionTracker;

fn create_test_setup() -> (Arc<dyn CatalogStore>, Vec<Candidate>) {
    let artworks = vec![
        Artwork::new("A1", "Impression, Sunrise", "Claude Monet", "https://img/A1.jpg"),
        Artwork::new("A2", "Luncheon of the Boating Party", "Pierre-Auguste Renoir", "https://img/A2.jpg"),
        Artwork::new("A3", "The Card Players", "Paul Cezanne", "https://img/A3.jpg")
            .with_external_id("303"),
        Artwork::new("A4", "The Dance Class", "Edgar Degas", "https://img/A4.jpg"),
    ];
    let catalog: Arc<dyn CatalogStore> = Arc::new(CatalogIndex::from_artworks(artworks).unwrap());

    // Worker ranking, best first
    let candidates = vec![
        Candidate::new("A1", CandidateSource::Recommendation, 0.97), // liked
        Candidate::new("A2", CandidateSource::Recommendation, 0.95), // already shown
        Candidate::new("999", CandidateSource::Recommendation, 0.93), // unknown to the catalog
        Candidate::new("303", CandidateSource::Recommendation, 0.90), // worker-side key for A3
        Candidate::new("A4", CandidateSource::Recommendation, 0.80),
    ];

    (catalog, candidates)
}

#[tokio::test]
async fn test_full_pipeline_filters_correctly() {
    let (_, candidates) = create_test_setup();
    let tracker = ExclusionTracker::in_memory();
    tracker.mark_viewed("u1", "A2").await;

    let context = build_viewer_context(&tracker, "u1", vec!["A1".into()], []).await;
    let filtered = FilterPipeline::standard().apply(candidates, &context).unwrap();

    let keys: Vec<&str> = filtered.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["999", "303", "A4"]);
}

#[tokio::test]
async fn test_enrichment_after_filtering() {
    let (catalog, candidates) = create_test_setup();
    let tracker = ExclusionTracker::in_memory();
    tracker.mark_viewed("u1", "A2").await;

    let context = build_viewer_context(&tracker, "u1", vec!["A1".into()], []).await;
    let filtered = FilterPipeline::new()
        .add_filter(AlreadySeenFilter)
        .add_filter(AlreadyLikedFilter)
        .apply(candidates, &context)
        .unwrap();

    let enriched = Enricher::new(catalog).enrich(filtered).await.unwrap();

    assert_eq!(enriched.len(), 2, "Unknown candidate should be dropped");
    assert_eq!(enriched[0].id(), "A3");
    assert_eq!(enriched[1].id(), "A4");
    for artwork in &enriched {
        assert!(!context.is_excluded(artwork.id()));
        assert_eq!(artwork.source, CandidateSource::Recommendation);
    }
}

#[tokio::test]
async fn test_everything_filtered_yields_nothing() {
    let (catalog, candidates) = create_test_setup();
    let tracker = ExclusionTracker::in_memory();

    let context = build_viewer_context(
        &tracker,
        "u1",
        vec![],
        ["A1", "A2", "A3", "A4", "999", "303"].map(String::from),
    )
    .await;
    let filtered = FilterPipeline::standard().apply(candidates, &context).unwrap();
    assert!(filtered.is_empty());

    let top = Enricher::new(catalog).enrich_first(filtered).await.unwrap();
    assert!(top.is_none());
}
