//! In-memory catalog index.
//!
//! Holds the full artwork collection with two lookups:
//! - primary: artwork id -> artwork
//! - external: worker-side key -> artwork id
//!
//! plus a stable id order used for uniform random sampling.

use crate::error::{CatalogError, Result};
use crate::parser;
use crate::types::{Artwork, ArtworkId};
use rand::Rng;
use rand::seq::IteratorRandom;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

/// Rejection-sampling attempts before scanning for eligible artworks
const SAMPLE_ATTEMPTS: usize = 8;

/// In-memory artwork catalog
#[derive(Debug, Default)]
pub struct CatalogIndex {
    artworks: HashMap<ArtworkId, Artwork>,
    order: Vec<ArtworkId>,
    external_index: HashMap<String, ArtworkId>,
}

impl CatalogIndex {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog export file (JSON array or JSON lines).
    ///
    /// Duplicate ids are rejected rather than silently overwritten.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading artwork catalog from {:?}", path);
        let artworks = parser::parse_catalog_file(path)?;
        let index = Self::from_artworks(artworks)?;
        info!("Catalog loaded with {} artworks", index.len());
        Ok(index)
    }

    /// Build a catalog from already-parsed artworks
    pub fn from_artworks(artworks: Vec<Artwork>) -> Result<Self> {
        let mut index = Self::new();
        for artwork in artworks {
            if index.artworks.contains_key(&artwork.id) {
                return Err(CatalogError::DuplicateId { id: artwork.id });
            }
            index.insert(artwork);
        }
        Ok(index)
    }

    /// Insert an artwork, replacing any previous artwork with the same id
    pub fn insert(&mut self, artwork: Artwork) {
        if let Some(external) = &artwork.external_id {
            self.external_index.insert(external.clone(), artwork.id.clone());
        }
        if !self.artworks.contains_key(&artwork.id) {
            self.order.push(artwork.id.clone());
        }
        self.artworks.insert(artwork.id.clone(), artwork);
    }

    pub fn get(&self, id: &str) -> Option<&Artwork> {
        self.artworks.get(id)
    }

    /// Look up an artwork by the key the recommendation worker knows it by
    pub fn get_by_external_id(&self, key: &str) -> Option<&Artwork> {
        self.external_index.get(key).and_then(|id| self.artworks.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All artworks in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Artwork> {
        self.order.iter().filter_map(|id| self.artworks.get(id))
    }

    /// Draw one artwork uniformly at random among those not in `excluded`.
    ///
    /// ## Algorithm
    /// A few rejection-sampling draws first, which is cheap while the
    /// exclusion set is small relative to the catalog. If every draw hits an
    /// excluded artwork, fall back to a single reservoir pass over the
    /// eligible ids. Both stages are uniform over the eligible set.
    ///
    /// Returns `None` only when every artwork is excluded.
    pub fn sample_excluding<R: Rng>(
        &self,
        excluded: &HashSet<ArtworkId>,
        rng: &mut R,
    ) -> Option<&Artwork> {
        if self.order.is_empty() {
            return None;
        }

        for _ in 0..SAMPLE_ATTEMPTS {
            let id = &self.order[rng.random_range(0..self.order.len())];
            if !excluded.contains(id) {
                return self.artworks.get(id);
            }
        }

        debug!(
            "Rejection sampling exhausted, scanning {} artworks ({} excluded)",
            self.order.len(),
            excluded.len()
        );
        self.order
            .iter()
            .filter(|id| !excluded.contains(*id))
            .choose(rng)
            .and_then(|id| self.artworks.get(id))
    }

    /// Case-insensitive substring search over title and artist.
    ///
    /// Exact title matches come first, then title substrings, then artist
    /// substrings.
    pub fn search(&self, query: &str) -> Vec<&Artwork> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<(u8, &Artwork)> = self
            .iter()
            .filter_map(|artwork| {
                let title = artwork.title.to_lowercase();
                let rank = if title == query {
                    0
                } else if title.contains(&query) {
                    1
                } else if artwork.artist.to_lowercase().contains(&query) {
                    2
                } else {
                    return None;
                };
                Some((rank, artwork))
            })
            .collect();

        // Stable sort keeps catalog order within a rank
        matches.sort_by_key(|(rank, _)| *rank);
        matches.into_iter().map(|(_, artwork)| artwork).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build_index(ids: &[&str]) -> CatalogIndex {
        let artworks = ids
            .iter()
            .map(|id| Artwork::new(*id, format!("Title {id}"), "Artist", format!("https://img/{id}.jpg")))
            .collect();
        CatalogIndex::from_artworks(artworks).unwrap()
    }

    #[test]
    fn test_sample_never_returns_excluded() {
        let index = build_index(&["a1", "a2", "a3", "a4"]);
        let excluded: HashSet<ArtworkId> = ["a1", "a2", "a4"].iter().map(|s| s.to_string()).collect();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let artwork = index.sample_excluding(&excluded, &mut rng).unwrap();
            assert_eq!(artwork.id, "a3");
        }
    }

    #[test]
    fn test_sample_returns_none_when_all_excluded() {
        let index = build_index(&["a1"]);
        let excluded: HashSet<ArtworkId> = ["a1".to_string()].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(index.sample_excluding(&excluded, &mut rng).is_none());
        assert!(CatalogIndex::new().sample_excluding(&HashSet::new(), &mut rng).is_none());
    }

    #[test]
    fn test_sample_covers_all_eligible_artworks() {
        let index = build_index(&["a1", "a2", "a3", "a4", "a5"]);
        let excluded: HashSet<ArtworkId> = ["a5".to_string()].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(42);

        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..4000 {
            let artwork = index.sample_excluding(&excluded, &mut rng).unwrap();
            *counts.entry(artwork.id.clone()).or_default() += 1;
        }

        assert_eq!(counts.len(), 4);
        // Expect ~1000 each; generous bounds keep the test stable
        for (id, count) in counts {
            assert!((800..1200).contains(&count), "{id} drawn {count} times");
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let artworks = vec![
            Artwork::new("a1", "One", "A", "u1"),
            Artwork::new("a1", "Again", "B", "u2"),
        ];
        let err = CatalogIndex::from_artworks(artworks).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { id } if id == "a1"));
    }

    #[test]
    fn test_external_id_lookup() {
        let mut index = CatalogIndex::new();
        index.insert(Artwork::new("65a1", "The Kiss", "Gustav Klimt", "u").with_external_id("1021"));

        assert_eq!(index.get_by_external_id("1021").unwrap().id, "65a1");
        assert!(index.get_by_external_id("65a1").is_none());
    }

    #[test]
    fn test_search_ranks_exact_title_first() {
        let mut index = CatalogIndex::new();
        index.insert(Artwork::new("1", "Sunflowers in a Vase", "Vincent van Gogh", "u"));
        index.insert(Artwork::new("2", "Sunflowers", "Vincent van Gogh", "u"));
        index.insert(Artwork::new("3", "Portrait", "Sunflowers Collective", "u"));
        index.insert(Artwork::new("4", "Haystacks", "Claude Monet", "u"));

        let results: Vec<&str> = index.search("sunflowers").iter().map(|a| a.id.as_str()).collect();
        assert_eq!(results, vec!["2", "1", "3"]);
        assert!(index.search("   ").is_empty());
    }
}
