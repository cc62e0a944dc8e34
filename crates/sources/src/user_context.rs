//! Helper to build a [`ViewerContext`] for one selection request.
//!
//! Gathers the viewer's exclusions once up front so the sources and
//! filters never query the tracker themselves.

use crate::types::ViewerContext;
use catalog::ArtworkId;
use tracing::debug;
use tracker::ExclusionTracker;

/// Build the context for `user_id` from their liked artworks, their
/// tracked exclusions, and any exclusions the client sent along.
pub async fn build_viewer_context<I>(
    tracker: &ExclusionTracker,
    user_id: &str,
    liked: Vec<ArtworkId>,
    extra_excluded: I,
) -> ViewerContext
where
    I: IntoIterator<Item = ArtworkId>,
{
    let excluded = tracker.get_excluded(user_id).await;

    let context = ViewerContext::new(user_id)
        .with_liked(liked)
        .with_excluded(excluded)
        .with_excluded(extra_excluded);

    debug!(
        "Built viewer context for {} (liked: {}, excluded: {})",
        user_id,
        context.liked.len(),
        context.excluded.len()
    );
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_context_merges_tracked_and_supplied_exclusions() {
        let tracker = ExclusionTracker::in_memory();
        tracker.mark_viewed("u1", "a2").await;

        let context = build_viewer_context(
            &tracker,
            "u1",
            vec!["a1".into(), "a1".into(), "a5".into()],
            vec!["a4".to_string()],
        )
        .await;

        assert_eq!(context.liked, vec!["a1".to_string(), "a5".to_string()]);
        assert!(context.is_excluded("a2"));
        assert!(context.is_excluded("a4"));
        assert!(!context.is_excluded("a1"));

        let sampling = context.sampling_exclusions();
        assert!(sampling.contains("a1"));
        assert_eq!(sampling.len(), 4);
    }
}
