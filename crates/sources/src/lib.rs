//! # Sources Crate
//!
//! Candidate sources for painting selection.
//!
//! ## Components
//!
//! ### Recommendation Source (worker path)
//! Similarity search against the viewer's liked artworks, answered by the
//! out-of-process recommendation worker. May fail in many ways; callers
//! fall back to sampling.
//!
//! ### Catalog Sampler (random path)
//! Uniform draw from the catalog outside the viewer's exclusions. Only
//! fails if the catalog itself does.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{CatalogSampler, RecommendationSource, user_context::build_viewer_context};
//!
//! let context = build_viewer_context(&tracker, "user-1", liked, []).await;
//!
//! let recommended = recommender.get_candidates(&context).await;
//! let fallback = sampler.sample(&context).await?;
//! ```

pub mod recommender;
pub mod sampler;
pub mod types;
pub mod user_context;

pub use recommender::{DEFAULT_RECOMMENDATION_COUNT, RecommendationSource};
pub use sampler::CatalogSampler;
pub use types::{Candidate, CandidateSource, ViewerContext};
pub use user_context::build_viewer_context;
