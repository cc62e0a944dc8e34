//! Filter to remove artworks the viewer has already been shown.
//!
//! The worker is asked to skip these too, but it is not trusted to: this
//! filter is the authority.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, ViewerContext};

/// Removes candidates in the viewer's exclusion set.
///
/// ## Algorithm
/// A candidate is dropped if either its worker key or its catalog key is in
/// `ViewerContext::excluded`.
pub struct AlreadySeenFilter;

impl Filter for AlreadySeenFilter {
    fn name(&self) -> &str {
        "AlreadySeenFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &ViewerContext,
    ) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !candidate.matches_any(&context.excluded))
            .collect();
        Ok(filtered)
    }
}
