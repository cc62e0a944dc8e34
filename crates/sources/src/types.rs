use catalog::{ArtworkId, UserId};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Which path produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    /// Similarity recommendation from the worker
    Recommendation,
    /// Uniform sample from the catalog
    Random,
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateSource::Recommendation => f.write_str("recommendation"),
            CandidateSource::Random => f.write_str("random"),
        }
    }
}

/// An artwork identifier proposed by a source, before enrichment
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Identifier as the source named it
    pub key: String,
    /// Catalog id, when the source already knows it
    pub catalog_key: Option<ArtworkId>,
    pub source: CandidateSource,
    pub score: f32,
}

impl Candidate {
    pub fn new(key: impl Into<String>, source: CandidateSource, score: f32) -> Self {
        Self {
            key: key.into(),
            catalog_key: None,
            source,
            score,
        }
    }

    pub fn with_catalog_key(mut self, catalog_key: impl Into<ArtworkId>) -> Self {
        self.catalog_key = Some(catalog_key.into());
        self
    }

    /// Whether either identifier of this candidate is in `ids`
    pub fn matches_any(&self, ids: &HashSet<ArtworkId>) -> bool {
        ids.contains(&self.key)
            || self
                .catalog_key
                .as_ref()
                .is_some_and(|key| ids.contains(key))
    }
}

/// Everything the selection path knows about the viewer for one request
#[derive(Debug, Clone, Default)]
pub struct ViewerContext {
    pub user_id: UserId,
    /// Liked artworks, most relevant first, without duplicates
    pub liked: Vec<ArtworkId>,
    /// Artworks the viewer has already been shown
    pub excluded: HashSet<ArtworkId>,
}

impl ViewerContext {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn with_liked<I, S>(mut self, liked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ArtworkId>,
    {
        let mut seen = HashSet::new();
        self.liked = liked
            .into_iter()
            .map(Into::into)
            .filter(|id: &ArtworkId| seen.insert(id.clone()))
            .collect();
        self
    }

    pub fn with_excluded<I, S>(mut self, excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ArtworkId>,
    {
        self.excluded.extend(excluded.into_iter().map(Into::into));
        self
    }

    pub fn has_liked(&self) -> bool {
        !self.liked.is_empty()
    }

    pub fn is_excluded(&self, id: &str) -> bool {
        self.excluded.contains(id)
    }

    /// Ids the random path must not return: everything already shown plus
    /// everything already liked
    pub fn sampling_exclusions(&self) -> HashSet<ArtworkId> {
        self.excluded
            .iter()
            .chain(self.liked.iter())
            .cloned()
            .collect()
    }
}
