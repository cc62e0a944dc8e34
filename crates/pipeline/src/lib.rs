//! Pipeline for filtering and enriching recommended artworks.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - Enricher for translating worker candidates into catalog artworks
//!
//! ## Architecture
//! Recommended candidates are processed in stages:
//! 1. Filters remove candidates the viewer has already seen or liked
//! 2. The Enricher resolves the survivors against the catalog, dropping
//!    any it cannot find
//! 3. The top survivor is what gets shown
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{Enricher, FilterPipeline};
//!
//! let filtered = FilterPipeline::standard().apply(candidates, &context)?;
//! let artwork = Enricher::new(catalog.clone()).enrich_first(filtered).await?;
//! ```

pub mod enrichment;
pub mod filter_pipeline;
pub mod filters;
pub mod traits;

// Re-export main types
pub use enrichment::{EnrichedArtwork, Enricher};
pub use filter_pipeline::FilterPipeline;
pub use traits::Filter;
