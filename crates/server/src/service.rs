//! Selection service: the operations behind the HTTP routes and the CLI.
//!
//! Ties the orchestrator to the exclusion tracker and applies the
//! exhaustion policy. Also owns the artist-affinity and stats calls that go
//! straight to the worker.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use catalog::{ArtworkId, CatalogStore};
use pipeline::EnrichedArtwork;
use sources::build_viewer_context;
use tracker::{ExclusionTracker, TrackerError};
use worker_client::{
    ARTIST_CALL_TIMEOUT, WorkerChannel, WorkerError, WorkerReply, WorkerRequest, WorkerState,
};

use crate::config::{ExhaustionPolicy, SelectionConfig};
use crate::error::SelectionError;
use crate::orchestrator::SelectionOrchestrator;

/// Worker health as reported by `/worker/stats`
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    /// `None` when the service runs without a worker
    pub state: Option<WorkerState>,
    /// The worker's own stats reply, when it could answer
    pub worker: Option<Map<String, Value>>,
}

#[derive(Clone)]
pub struct SelectionService {
    orchestrator: Arc<SelectionOrchestrator>,
    tracker: ExclusionTracker,
    catalog: Arc<dyn CatalogStore>,
    channel: Option<WorkerChannel>,
}

impl SelectionService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        tracker: ExclusionTracker,
        channel: Option<WorkerChannel>,
        config: SelectionConfig,
    ) -> Self {
        let orchestrator = SelectionOrchestrator::new(catalog.clone(), channel.clone(), config);
        Self {
            orchestrator: Arc::new(orchestrator),
            tracker,
            catalog,
            channel,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogStore> {
        &self.catalog
    }

    pub fn tracker(&self) -> &ExclusionTracker {
        &self.tracker
    }

    pub fn channel(&self) -> Option<&WorkerChannel> {
        self.channel.as_ref()
    }

    /// Choose the next artwork for `user_id`.
    ///
    /// `extra_excluded` are ids the client wants skipped on top of what the
    /// tracker remembers. Under [`ExhaustionPolicy::WrapAround`] an
    /// exhausted viewer's tracked set is cleared once and selection retried
    /// with only `extra_excluded`.
    #[instrument(skip(self, liked, extra_excluded), fields(liked = liked.len()))]
    pub async fn select_for(
        &self,
        user_id: &str,
        liked: Vec<ArtworkId>,
        extra_excluded: Vec<ArtworkId>,
    ) -> Result<EnrichedArtwork, SelectionError> {
        let context =
            build_viewer_context(&self.tracker, user_id, liked.clone(), extra_excluded.clone()).await;

        match self.orchestrator.select_next(&context).await {
            Err(SelectionError::CatalogExhausted)
                if self.orchestrator.config().exhaustion_policy == ExhaustionPolicy::WrapAround =>
            {
                if let Err(e) = self.tracker.reset(user_id).await {
                    warn!("Could not reset viewed set for wrap-around: {}", e);
                    return Err(SelectionError::CatalogExhausted);
                }
                info!("User {} saw the whole catalog, starting over", user_id);

                let context = sources::ViewerContext::new(user_id)
                    .with_liked(liked)
                    .with_excluded(extra_excluded);
                self.orchestrator.select_next(&context).await
            }
            result => result,
        }
    }

    /// Record a view; never fails
    pub async fn mark_viewed(&self, user_id: &str, artwork_id: &str) {
        self.tracker.mark_viewed(user_id, artwork_id).await;
    }

    /// Forget every view recorded for `user_id`
    pub async fn reset_viewed(&self, user_id: &str) -> Result<(), TrackerError> {
        self.tracker.reset(user_id).await
    }

    /// Artist-affinity recommendations: artist names weighted by how many
    /// of their artworks the viewer liked
    #[instrument(skip(self, artists, weights), fields(artists = artists.len()))]
    pub async fn recommend_artists(
        &self,
        artists: Vec<String>,
        weights: Vec<u32>,
    ) -> Result<WorkerReply, WorkerError> {
        let channel = self
            .channel
            .as_ref()
            .ok_or(WorkerError::Unavailable(WorkerState::Stopped))?;
        let request = WorkerRequest::Artists { artists, weights };
        channel.call(&request, ARTIST_CALL_TIMEOUT).await
    }

    pub async fn worker_status(&self) -> WorkerStatus {
        let Some(channel) = &self.channel else {
            return WorkerStatus { state: None, worker: None };
        };

        let worker = match channel.call(&WorkerRequest::Stats, channel.config().call_timeout).await {
            Ok(reply) => Some(reply.metadata),
            Err(e) => {
                warn!("Worker stats unavailable: {}", e);
                None
            }
        };
        WorkerStatus {
            state: Some(channel.state()),
            worker,
        }
    }

    /// Stop the worker, if any
    pub async fn shutdown(&self) {
        if let Some(channel) = &self.channel {
            channel.shutdown().await;
        }
    }
}
