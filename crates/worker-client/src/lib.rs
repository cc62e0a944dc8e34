//! Client for the out-of-process recommendation worker.
//!
//! The worker is a long-lived child process that keeps an embedding model
//! in memory and answers similarity queries. This crate handles:
//! - Spawning the worker and waiting for its readiness marker
//! - Restarting it with a fixed backoff when it exits
//! - One request/response exchange at a time over its stdin/stdout
//! - Mapping every failure onto [`WorkerError`] so callers can fall back

pub mod channel;
pub mod config;
pub mod error;
pub mod protocol;
pub mod state;

pub use channel::WorkerChannel;
pub use config::{ARTIST_CALL_TIMEOUT, DEFAULT_CALL_TIMEOUT, WorkerConfig};
pub use error::WorkerError;
pub use protocol::{RecommendAction, WorkerCandidate, WorkerReply, WorkerRequest};
pub use state::WorkerState;
