//! Sync status and manual refresh.

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use tracing::info;

use crate::middleware::RequireIdentity;
use crate::services::SyncStatus;
use crate::state::AppState;

/// Build the sync router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/sync", get(status).post(refresh))
}

/// Current sync status.
///
/// GET /api/sync
async fn status(
    State(state): State<AppState>,
    RequireIdentity(_): RequireIdentity,
) -> Json<SyncStatus> {
    Json(state.cache().status().await)
}

/// Refresh in the foreground and report the result.
///
/// A failed fetch is not an error here: the response carries `has_error`
/// and the last good snapshot stays in place.
///
/// POST /api/sync
async fn refresh(
    State(state): State<AppState>,
    RequireIdentity(current): RequireIdentity,
) -> Json<SyncStatus> {
    let outcome = state.cache().refresh(false).await;
    info!(name = current.identity.display_name(), ?outcome, "Manual refresh");
    Json(state.cache().status().await)
}
