use crate::state::WorkerState;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when calling the recommendation worker.
///
/// Every variant is recoverable from the caller's point of view: the
/// selection path falls back to random sampling on any of them.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Recommendation worker is not ready (state: {0})")]
    Unavailable(WorkerState),

    #[error("Recommendation worker is busy with another request")]
    Busy,

    #[error("Recommendation worker did not reply within {0:?}")]
    Timeout(Duration),

    #[error("Recommendation worker rejected the request: {0}")]
    Rejected(String),

    #[error("Recommendation worker exited with a request in flight")]
    Exited,

    #[error("I/O error on worker pipes: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed worker message: {0}")]
    Protocol(#[from] serde_json::Error),
}

impl WorkerError {
    /// Whether the failure came from the worker's own answer rather than
    /// from the channel
    pub fn is_rejection(&self) -> bool {
        matches!(self, WorkerError::Rejected(_))
    }
}
