//! # Catalog Crate
//!
//! The artwork catalog: domain types, the document-store seam used by the
//! selection path, and an in-memory store loaded from a catalog export.
//!
//! ## Main Components
//!
//! - **types**: `Artwork`, `LikedArtwork`, id aliases
//! - **parser**: parse catalog export files into artworks
//! - **index**: `CatalogIndex`, the in-memory store with uniform sampling
//! - **store**: `CatalogStore`, the async trait the selection path codes against
//! - **error**: error types for loading and querying
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{CatalogIndex, CatalogStore};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let index = CatalogIndex::load_from_file(Path::new("data/paintings.jsonl"))?;
//! let store: Arc<dyn CatalogStore> = Arc::new(index);
//!
//! let next = store.sample_excluding(&already_seen).await?;
//! ```

pub mod error;
pub mod index;
pub mod parser;
pub mod store;
pub mod types;

pub use error::{CatalogError, Result};
pub use index::CatalogIndex;
pub use store::CatalogStore;
pub use types::{Artwork, ArtworkId, LikedArtwork, UserId, dedup_liked};
