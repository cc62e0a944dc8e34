//! Filter to remove artworks the viewer already liked.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, ViewerContext};
use std::collections::HashSet;

/// Removes candidates that are in the viewer's liked set.
pub struct AlreadyLikedFilter;

impl Filter for AlreadyLikedFilter {
    fn name(&self) -> &str {
        "AlreadyLikedFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &ViewerContext,
    ) -> Result<Vec<Candidate>> {
        if context.liked.is_empty() {
            return Ok(candidates);
        }
        let liked: HashSet<_> = context.liked.iter().cloned().collect();
        Ok(candidates
            .into_iter()
            .filter(|candidate| !candidate.matches_any(&liked))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::CandidateSource;

    #[test]
    fn test_already_liked_filter() {
        let context = ViewerContext::new("u1").with_liked(["A1"]);
        let candidates = vec![
            Candidate::new("A1", CandidateSource::Recommendation, 0.99),
            Candidate::new("A2", CandidateSource::Recommendation, 0.5),
        ];

        let filtered = AlreadyLikedFilter.apply(candidates, &context).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].key, "A2");
    }
}
