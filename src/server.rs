use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::fetch::FetchJobs;
use crate::store::{SnapshotKey, SnapshotStore};

#[derive(Clone)]
pub struct AppState {
    pub store: SnapshotStore,
    pub jobs: Arc<FetchJobs>,
}

/// Build the Axum router for the scoreboard API. Display clients load it
/// cross-origin, hence the permissive CORS layer.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/scoreboard/upcoming", get(upcoming_handler))
        .route("/api/scoreboard/live", get(live_handler))
        .route("/api/scoreboard/pointtable/:matchid", get(pointtable_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn index_handler() -> &'static str {
    "Scoreboard proxy running"
}

/// The stored snapshot verbatim, or the waiting placeholder with 200. These
/// endpoints never error; before the first successful tick the clients just
/// see the placeholder.
fn snapshot_or_waiting(store: &SnapshotStore, key: &SnapshotKey) -> Response {
    match store.read(key) {
        Some(snapshot) => Json(snapshot).into_response(),
        None => Json(json!({"status": "waiting_for_data"})).into_response(),
    }
}

/// GET /api/scoreboard/upcoming
async fn upcoming_handler(State(state): State<Arc<AppState>>) -> Response {
    snapshot_or_waiting(&state.store, &SnapshotKey::Upcoming)
}

/// GET /api/scoreboard/live
async fn live_handler(State(state): State<Arc<AppState>>) -> Response {
    snapshot_or_waiting(&state.store, &SnapshotKey::Live)
}

/// GET /api/scoreboard/pointtable/:matchid
///
/// Cache hit returns the stored snapshot without touching the network.
/// Otherwise the point-table job runs on the spot; this is the one endpoint
/// that can block on the upstream and surface its failure.
async fn pointtable_handler(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<String>,
) -> Response {
    if !valid_match_id(&match_id) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid match id"})),
        )
            .into_response();
    }

    let key = SnapshotKey::PointTable(match_id.clone());
    if let Some(snapshot) = state.store.read(&key) {
        return Json(snapshot).into_response();
    }

    match state.jobs.refresh_pointtable(&match_id).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => {
            warn!("On-demand point table fetch failed ({}): {:#}", match_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("{:#}", e)})),
            )
                .into_response()
        }
    }
}

/// Match ids become file names in the store, so only a conservative
/// character set is accepted.
fn valid_match_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
