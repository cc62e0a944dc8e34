//! Core domain types for the artwork catalog.
//!
//! Identifiers are plain strings: user identities are self-asserted by the
//! client and artwork ids come straight from the document store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Opaque, self-asserted identity of one client
pub type UserId = String;

/// Identifier of an artwork, unique within the catalog
pub type ArtworkId = String;

// =============================================================================
// Artwork
// =============================================================================

/// One cataloged artwork. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    #[serde(rename = "_id")]
    pub id: ArtworkId,
    pub title: String,
    pub artist: String,
    /// At least one image location for display
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Key the recommendation worker uses for this artwork, when it differs
    /// from `id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl Artwork {
    pub fn new(
        id: impl Into<ArtworkId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            image_urls: vec![image_url.into()],
            style: None,
            genre: None,
            year: None,
            external_id: None,
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// First image location, used as the display image
    pub fn primary_image(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }
}

// =============================================================================
// Liked artworks
// =============================================================================

/// A user liked a specific artwork at a point in time.
///
/// Unique per (user, artwork): see [`dedup_liked`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikedArtwork {
    pub user_id: UserId,
    pub artwork_id: ArtworkId,
    /// Milliseconds since the Unix epoch
    pub liked_at: Option<u64>,
}

impl LikedArtwork {
    pub fn new(user_id: impl Into<UserId>, artwork_id: impl Into<ArtworkId>) -> Self {
        Self {
            user_id: user_id.into(),
            artwork_id: artwork_id.into(),
            liked_at: None,
        }
    }
}

/// Collapse duplicate (user, artwork) pairs, keeping the most recent like
/// and the first-seen order.
pub fn dedup_liked(liked: Vec<LikedArtwork>) -> Vec<LikedArtwork> {
    let mut position: HashMap<(UserId, ArtworkId), usize> = HashMap::new();
    let mut unique: Vec<LikedArtwork> = Vec::with_capacity(liked.len());

    for entry in liked {
        let key = (entry.user_id.clone(), entry.artwork_id.clone());
        match position.get(&key) {
            Some(&idx) => {
                if entry.liked_at > unique[idx].liked_at {
                    unique[idx].liked_at = entry.liked_at;
                }
            }
            None => {
                position.insert(key, unique.len());
                unique.push(entry);
            }
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_liked_keeps_latest_timestamp() {
        let liked = vec![
            LikedArtwork { liked_at: Some(10), ..LikedArtwork::new("u1", "a1") },
            LikedArtwork::new("u1", "a2"),
            LikedArtwork { liked_at: Some(30), ..LikedArtwork::new("u1", "a1") },
            LikedArtwork::new("u2", "a1"),
        ];

        let unique = dedup_liked(liked);

        assert_eq!(unique.len(), 3);
        assert_eq!(unique[0].artwork_id, "a1");
        assert_eq!(unique[0].liked_at, Some(30));
        assert_eq!(unique[1].artwork_id, "a2");
        assert_eq!(unique[2].user_id, "u2");
    }

    #[test]
    fn test_artwork_serializes_with_document_id() {
        let artwork = Artwork::new("a1", "Water Lilies", "Claude Monet", "https://img/a1.jpg");
        let json = serde_json::to_value(&artwork).unwrap();

        assert_eq!(json["_id"], "a1");
        assert_eq!(json["artist"], "Claude Monet");
        assert!(json.get("external_id").is_none());
    }
}
