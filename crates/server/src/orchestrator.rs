//! # Selection Orchestrator
//!
//! Picks exactly one artwork to show a viewer:
//! 1. If the viewer has liked artworks, flip a weighted coin
//! 2. On heads, ask the recommendation worker for similar artworks
//! 3. Filter out anything already seen or liked
//! 4. Enrich the best survivor from the catalog
//! 5. Re-check the result against the exclusions
//! 6. Otherwise (tails, no likes, any failure, nothing usable) sample the
//!    catalog uniformly outside the exclusions
//! 7. If sampling finds nothing, the catalog is exhausted for this viewer
//!
//! The whole recommendation attempt runs under one deadline, so a slow
//! worker and an absent worker look the same to the caller.
//!
//! Selection does not record anything as viewed; the client acknowledges
//! views separately.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use catalog::CatalogStore;
use pipeline::{EnrichedArtwork, Enricher, FilterPipeline};
use sources::{CatalogSampler, RecommendationSource, ViewerContext};
use worker_client::WorkerChannel;

use crate::config::SelectionConfig;
use crate::error::SelectionError;

/// Coordinates the recommendation and random paths
#[derive(Clone)]
pub struct SelectionOrchestrator {
    recommender: Option<RecommendationSource>,
    sampler: CatalogSampler,
    filter_pipeline: Arc<FilterPipeline>,
    enricher: Enricher,
    config: SelectionConfig,
}

impl SelectionOrchestrator {
    /// Create an orchestrator. Without a worker channel every selection
    /// takes the random path.
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        channel: Option<WorkerChannel>,
        config: SelectionConfig,
    ) -> Self {
        let recommender = channel.map(|channel| {
            let timeout = channel.config().call_timeout;
            RecommendationSource::new(channel)
                .with_count(config.recommend_count)
                .with_timeout(timeout)
                .with_action(config.action)
        });

        Self {
            recommender,
            sampler: CatalogSampler::new(catalog.clone()),
            filter_pipeline: Arc::new(FilterPipeline::standard()),
            enricher: Enricher::new(catalog),
            config,
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Main entry point: choose the next artwork for a viewer
    #[instrument(skip(self, context), fields(user_id = %context.user_id))]
    pub async fn select_next(
        &self,
        context: &ViewerContext,
    ) -> Result<EnrichedArtwork, SelectionError> {
        let start_time = Instant::now();

        if self.should_recommend(context) {
            match tokio::time::timeout(self.config.recommend_budget, self.recommend(context)).await {
                Ok(Ok(Some(artwork))) => {
                    info!(
                        "Selected {} via recommendation in {:.2?}",
                        artwork.id(),
                        start_time.elapsed()
                    );
                    return Ok(artwork);
                }
                Ok(Ok(None)) => debug!("No usable recommendation, falling back to random"),
                Ok(Err(e)) => debug!("Recommendation path failed, falling back to random: {:#}", e),
                Err(_) => warn!(
                    "Recommendation path exceeded {:?}, falling back to random",
                    self.config.recommend_budget
                ),
            }
        }

        let artwork = self.sample(context).await?;
        info!(
            "Selected {} via random sampling in {:.2?}",
            artwork.id(),
            start_time.elapsed()
        );
        Ok(artwork)
    }

    /// Whether this selection should try the worker
    fn should_recommend(&self, context: &ViewerContext) -> bool {
        if !context.has_liked() || self.recommender.is_none() {
            return false;
        }
        rand::random::<f64>() < self.config.recommend_probability
    }

    /// Recommendation path. `Ok(None)` means the worker answered but
    /// nothing it proposed can be shown.
    async fn recommend(&self, context: &ViewerContext) -> Result<Option<EnrichedArtwork>> {
        let Some(recommender) = &self.recommender else {
            return Ok(None);
        };

        let candidates = recommender.get_candidates(context).await?;
        let filtered = self.filter_pipeline.apply(candidates, context)?;
        debug!("{} recommendation candidates after filtering", filtered.len());

        let Some(artwork) = self.enricher.enrich_first(filtered).await? else {
            return Ok(None);
        };

        // Worker keys can translate onto catalog ids the filters never saw
        if !self.is_showable(context, artwork.id()) {
            debug!("Recommended {} is excluded after enrichment, discarding", artwork.id());
            return Ok(None);
        }
        Ok(Some(artwork))
    }

    /// Random path
    async fn sample(&self, context: &ViewerContext) -> Result<EnrichedArtwork, SelectionError> {
        match self.sampler.sample(context).await? {
            Some(artwork) if self.is_showable(context, &artwork.id) => {
                Ok(EnrichedArtwork::from_catalog(artwork))
            }
            Some(artwork) => {
                // Catalog stores promise this never happens
                warn!("Sampler returned excluded artwork {}", artwork.id);
                Err(SelectionError::CatalogExhausted)
            }
            None => {
                info!("Catalog exhausted for user {}", context.user_id);
                Err(SelectionError::CatalogExhausted)
            }
        }
    }

    fn is_showable(&self, context: &ViewerContext, id: &str) -> bool {
        !context.is_excluded(id) && !context.liked.iter().any(|liked| liked == id)
    }
}
