use catalog::{ArtworkId, UserId};
use thiserror::Error;

/// Errors raised by exclusion stores.
///
/// The tracker itself only surfaces these from `reset`; reads and writes
/// on the selection path are logged and absorbed.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Exclusion store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to record {artwork_id} as viewed by {user_id}: {reason}")]
    WriteFailed {
        user_id: UserId,
        artwork_id: ArtworkId,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, TrackerError>;
