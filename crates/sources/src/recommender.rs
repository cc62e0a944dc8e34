//! Recommendation Source - the worker path
//!
//! Asks the recommendation worker for artworks similar to the viewer's
//! liked set.
//!
//! ## Algorithm
//! 1. Send the liked ids and the shown ids (sorted, so requests are
//!    reproducible) with the configured count
//! 2. Keep the worker's ranking; the first candidate is the best match
//! 3. Any channel failure is returned as-is for the caller to fall back on

use crate::types::{Candidate, CandidateSource, ViewerContext};
use std::time::Duration;
use tracing::{debug, instrument};
use worker_client::{
    DEFAULT_CALL_TIMEOUT, RecommendAction, WorkerChannel, WorkerError, WorkerRequest,
};

pub const DEFAULT_RECOMMENDATION_COUNT: usize = 10;

#[derive(Clone)]
pub struct RecommendationSource {
    channel: WorkerChannel,
    count: usize,
    timeout: Duration,
    action: RecommendAction,
}

impl RecommendationSource {
    pub fn new(channel: WorkerChannel) -> Self {
        Self {
            channel,
            count: DEFAULT_RECOMMENDATION_COUNT,
            timeout: DEFAULT_CALL_TIMEOUT,
            action: RecommendAction::default(),
        }
    }

    /// Number of recommendations to ask for (default: 10)
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Per-call timeout (default: 5s)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_action(mut self, action: RecommendAction) -> Self {
        self.action = action;
        self
    }

    pub fn channel(&self) -> &WorkerChannel {
        &self.channel
    }

    pub fn build_request(&self, context: &ViewerContext) -> WorkerRequest {
        let mut excluded: Vec<String> = context.excluded.iter().cloned().collect();
        excluded.sort_unstable();
        WorkerRequest::similar(self.action, context.liked.clone(), excluded, self.count)
    }

    /// Ranked recommendations for the viewer
    #[instrument(skip(self, context), fields(user_id = %context.user_id))]
    pub async fn get_candidates(
        &self,
        context: &ViewerContext,
    ) -> Result<Vec<Candidate>, WorkerError> {
        let request = self.build_request(context);
        let reply = self.channel.call(&request, self.timeout).await?;

        let candidates: Vec<Candidate> = reply
            .recommendations
            .into_iter()
            .map(|rec| {
                let score = rec.score.unwrap_or(0.0) as f32;
                let candidate = Candidate::new(rec.key, CandidateSource::Recommendation, score);
                match rec.catalog_id {
                    Some(catalog_id) => candidate.with_catalog_key(catalog_id),
                    None => candidate,
                }
            })
            .collect();

        debug!("Worker proposed {} candidates", candidates.len());
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use worker_client::{WorkerConfig, WorkerState};

    fn idle_channel() -> WorkerChannel {
        WorkerChannel::start(WorkerConfig::new("/nonexistent/painting-worker"))
    }

    #[tokio::test]
    async fn test_request_carries_liked_and_sorted_exclusions() {
        let source = RecommendationSource::new(idle_channel())
            .with_count(4)
            .with_action(RecommendAction::Diverse);
        let context = ViewerContext::new("u1")
            .with_liked(["A1"])
            .with_excluded(["A9", "A2"]);

        let request = source.build_request(&context);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "action": "diverse",
                "liked_paintings": ["A1"],
                "exclude_paintings": ["A2", "A9"],
                "count": 4
            })
        );
        source.channel().shutdown().await;
    }

    #[tokio::test]
    async fn test_unavailable_worker_is_an_error() {
        let source = RecommendationSource::new(idle_channel());
        let context = ViewerContext::new("u1").with_liked(["A1"]);

        let result = source.get_candidates(&context).await;
        assert!(matches!(result, Err(WorkerError::Unavailable(_))));
        source.channel().shutdown().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_candidates_keep_worker_ranking() {
        let channel = WorkerChannel::start(
            WorkerConfig::new("/bin/sh")
                .with_args([
                    "-c",
                    r#"echo ready >&2
while read line; do echo '{"recommendations":[{"_id":"c1","mongodb_id":"A3","similarity_score":0.9},{"id":"A4","score":0.4}]}'; done"#,
                ])
                .with_ready_marker("ready"),
        );
        assert!(channel.wait_for_state(WorkerState::Ready, Duration::from_secs(5)).await);

        let source = RecommendationSource::new(channel);
        let context = ViewerContext::new("u1").with_liked(["A1"]);
        let candidates = source.get_candidates(&context).await.unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].key, "c1");
        assert_eq!(candidates[0].catalog_key.as_deref(), Some("A3"));
        assert_eq!(candidates[1].key, "A4");
        assert!(candidates.iter().all(|c| c.source == CandidateSource::Recommendation));

        source.channel().shutdown().await;
    }
}
