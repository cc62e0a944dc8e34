use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{Span, info, instrument};

use catalog::parser::normalize_key;
use catalog::{ArtworkId, LikedArtwork, dedup_liked};
use pipeline::EnrichedArtwork;

use crate::error::ApiError;
use crate::identity::{UserIdentity, identity_cookie};
use crate::service::{SelectionService, WorkerStatus};
use crate::state::AppState;

const USER_SESSION_PATH: &str = "/user-session";
const SELECT_PATH: &str = "/random-unviewed";
const VIEWED_PATH: &str = "/viewed";
const ARTIST_RECOMMEND_PATH: &str = "/recommend";
const WORKER_STATS_PATH: &str = "/worker/stats";

pub fn build(app_state: AppState) -> Router {
    Router::new()
        .route(USER_SESSION_PATH, get(user_session))
        .route(SELECT_PATH, post(select_next))
        .route(VIEWED_PATH, post(mark_viewed).delete(reset_viewed))
        .route(ARTIST_RECOMMEND_PATH, post(recommend_artists))
        .route(WORKER_STATS_PATH, get(worker_stats))
        .layer(TraceLayer::new_for_http().on_response(
            |res: &Response, latency: Duration, _span: &Span| {
                info!("returned {} in {}ms", res.status(), latency.as_millis());
            },
        ))
        .with_state(app_state)
}

/// Catalog id out of whatever the client sent: a bare string or number, or
/// an artwork object carrying `_id` or `id`
fn artwork_key(value: &Value) -> Option<ArtworkId> {
    match value {
        Value::Object(fields) => match fields.get("_id").or_else(|| fields.get("id")) {
            Some(id) => normalize_key(id),
            None => normalize_key(value),
        },
        other => normalize_key(other),
    }
}

/// Liked ids from the client's saved paintings, one per artwork, most
/// recently liked first
fn liked_ids(user_id: &str, saved: &[Value]) -> Vec<ArtworkId> {
    let liked = saved
        .iter()
        .filter_map(|entry| {
            let artwork_id = artwork_key(entry)?;
            let liked_at = entry.get("likedTimestamp").and_then(Value::as_u64);
            Some(LikedArtwork {
                liked_at,
                ..LikedArtwork::new(user_id, artwork_id)
            })
        })
        .collect();

    let mut liked = dedup_liked(liked);
    liked.sort_by(|a, b| b.liked_at.cmp(&a.liked_at));
    liked.into_iter().map(|like| like.artwork_id).collect()
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Serialize)]
struct SessionResponse {
    #[serde(rename = "userId")]
    user_id: String,
}

async fn user_session(headers: HeaderMap, jar: CookieJar) -> (CookieJar, Json<SessionResponse>) {
    match UserIdentity::from_headers(&headers) {
        Some(UserIdentity(user_id)) => (jar, Json(SessionResponse { user_id })),
        None => {
            let user_id = uuid::Uuid::new_v4().to_string();
            info!("Issued new user id {}", user_id);
            (
                jar.add(identity_cookie(user_id.clone())),
                Json(SessionResponse { user_id }),
            )
        }
    }
}

// =============================================================================
// Selection
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectRequest {
    #[serde(default)]
    saved_paintings: Vec<Value>,
    #[serde(default)]
    exclude_ids: Vec<Value>,
}

#[instrument(skip(service, request), fields(user_id = %user.as_str()))]
async fn select_next(
    State(service): State<SelectionService>,
    user: UserIdentity,
    Json(request): Json<SelectRequest>,
) -> Result<Json<EnrichedArtwork>, ApiError> {
    let liked = liked_ids(user.as_str(), &request.saved_paintings);
    let excluded: Vec<ArtworkId> = request.exclude_ids.iter().filter_map(artwork_key).collect();

    let artwork = service.select_for(user.as_str(), liked, excluded).await?;
    Ok(Json(artwork))
}

// =============================================================================
// Viewed set
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewedRequest {
    painting_id: Value,
}

#[derive(Debug, Serialize)]
struct Ack {
    ok: bool,
}

async fn mark_viewed(
    State(service): State<SelectionService>,
    user: UserIdentity,
    Json(request): Json<ViewedRequest>,
) -> Result<Json<Ack>, ApiError> {
    let painting_id = artwork_key(&request.painting_id)
        .ok_or_else(|| ApiError::BadRequest("paintingId must be a string or number".into()))?;

    service.mark_viewed(user.as_str(), &painting_id).await;
    Ok(Json(Ack { ok: true }))
}

async fn reset_viewed(
    State(service): State<SelectionService>,
    user: UserIdentity,
) -> Result<Json<Ack>, ApiError> {
    service.reset_viewed(user.as_str()).await?;
    Ok(Json(Ack { ok: true }))
}

// =============================================================================
// Worker passthrough
// =============================================================================

#[derive(Debug, Deserialize)]
struct ArtistRequest {
    artists: Vec<String>,
    counts: Vec<u32>,
}

#[derive(Debug, Serialize)]
struct ArtistResponse {
    recommendations: Vec<String>,
}

async fn recommend_artists(
    State(service): State<SelectionService>,
    Json(request): Json<ArtistRequest>,
) -> Result<Json<ArtistResponse>, ApiError> {
    if request.artists.is_empty() {
        return Err(ApiError::BadRequest("artists must not be empty".into()));
    }
    if request.artists.len() != request.counts.len() {
        return Err(ApiError::BadRequest(format!(
            "artists and counts differ in length ({} vs {})",
            request.artists.len(),
            request.counts.len()
        )));
    }

    let reply = service
        .recommend_artists(request.artists, request.counts)
        .await?;
    Ok(Json(ArtistResponse {
        recommendations: reply.recommendations.into_iter().map(|c| c.key).collect(),
    }))
}

async fn worker_stats(State(service): State<SelectionService>) -> Json<WorkerStatus> {
    Json(service.worker_status().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_artwork_key_shapes() {
        assert_eq!(artwork_key(&json!("A1")).as_deref(), Some("A1"));
        assert_eq!(artwork_key(&json!(42)).as_deref(), Some("42"));
        assert_eq!(artwork_key(&json!({"_id": "A2", "title": "x"})).as_deref(), Some("A2"));
        assert_eq!(artwork_key(&json!({"id": 7})).as_deref(), Some("7"));
        assert_eq!(artwork_key(&json!({"title": "no id"})), None);
        assert_eq!(artwork_key(&json!(null)), None);
        assert_eq!(artwork_key(&json!({"$oid": "65a1"})).as_deref(), Some("65a1"));
    }

    #[test]
    fn test_liked_ids_dedup_and_recency_order() {
        let saved = vec![
            json!({"_id": "A1", "likedTimestamp": 100}),
            json!("A2"),
            json!({"_id": "A3", "likedTimestamp": 300}),
            json!({"_id": "A1", "likedTimestamp": 500}),
            json!({"title": "no id"}),
        ];

        assert_eq!(liked_ids("u1", &saved), vec!["A1", "A3", "A2"]);
    }
}
