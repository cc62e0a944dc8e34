use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog::CatalogError;
use serde_json::json;
use thiserror::Error;
use tracker::TrackerError;
use worker_client::WorkerError;

/// Failures of a single selection.
///
/// Worker failures never appear here: the orchestrator recovers from all
/// of them by sampling.
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("No more artworks available for this user")]
    CatalogExhausted,

    #[error("Catalog lookup failed: {0}")]
    Catalog(#[from] CatalogError),
}

/// Errors surfaced to HTTP clients
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing user identity: send an x-user-id header or a userId cookie")]
    MissingIdentity,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Recommendation service unavailable: {0}")]
    Worker(#[from] WorkerError),

    #[error("Viewed-set store unavailable: {0}")]
    Tracker(#[from] TrackerError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingIdentity | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Selection(SelectionError::CatalogExhausted) => StatusCode::NOT_FOUND,
            ApiError::Selection(SelectionError::Catalog(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Worker(_) | ApiError::Tracker(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = match &self {
            ApiError::Worker(_) => json!({ "error": self.to_string(), "recommendations": [] }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
