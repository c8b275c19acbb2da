//! Record listing and mutations.
//!
//! Mutations are dispatched to the Apps Script endpoint and never touch
//! the local snapshot. A `202 Accepted` means only that the request left;
//! the change becomes visible after the follow-up refresh, or not at all
//! if the script rejected it.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use pkl_monitor_core::{Identity, RecordDraft, VendorRecord, canonical_district};
use serde::Serialize;
use tracing::info;

use crate::error::AppError;
use crate::middleware::RequireIdentity;
use crate::services::{RecordQuery, query, scope};
use crate::sheets::{Dispatched, MutationAction};
use crate::state::AppState;

/// Build the records router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/records", get(list).post(create))
        .route("/api/records/{id}", put(update).delete(remove))
}

#[derive(Debug, Serialize)]
pub struct RecordList {
    pub records: Vec<VendorRecord>,
    pub total: usize,
}

/// Acknowledgement of a dispatched mutation.
#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub dispatched: bool,
    pub action: MutationAction,
    pub id: String,
}

impl From<Dispatched> for DispatchResponse {
    fn from(dispatched: Dispatched) -> Self {
        Self {
            dispatched: true,
            action: dispatched.action,
            id: dispatched.id,
        }
    }
}

/// Filtered list of visible records.
///
/// GET /api/records?q=&district=&status=
async fn list(
    State(state): State<AppState>,
    RequireIdentity(current): RequireIdentity,
    Query(filter): Query<RecordQuery>,
) -> Json<RecordList> {
    let snapshot = state.cache().snapshot().await;
    let visible = scope(&snapshot.records, &current.identity);
    let records: Vec<VendorRecord> = query(visible.iter().copied(), &filter)
        .into_iter()
        .cloned()
        .collect();

    Json(RecordList {
        total: records.len(),
        records,
    })
}

/// Create a record.
///
/// POST /api/records
async fn create(
    State(state): State<AppState>,
    RequireIdentity(current): RequireIdentity,
    Json(mut draft): Json<RecordDraft>,
) -> Result<(StatusCode, Json<DispatchResponse>), AppError> {
    prepare_draft(&mut draft)?;
    ensure_covers(&current.identity, &draft.district)?;

    let dispatched = state.gateway().create(&draft).await?;
    Ok(accepted(&state, &current.identity, dispatched))
}

/// Update a record.
///
/// PUT /api/records/{id}
async fn update(
    State(state): State<AppState>,
    RequireIdentity(current): RequireIdentity,
    Path(id): Path<String>,
    Json(mut draft): Json<RecordDraft>,
) -> Result<(StatusCode, Json<DispatchResponse>), AppError> {
    draft.id = id;
    prepare_draft(&mut draft)?;
    ensure_visible(&state, &current.identity, &draft.id).await?;
    ensure_covers(&current.identity, &draft.district)?;

    let dispatched = state.gateway().update(&draft).await?;
    Ok(accepted(&state, &current.identity, dispatched))
}

/// Delete a record.
///
/// DELETE /api/records/{id}
async fn remove(
    State(state): State<AppState>,
    RequireIdentity(current): RequireIdentity,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<DispatchResponse>), AppError> {
    ensure_visible(&state, &current.identity, &id).await?;

    let dispatched = state.gateway().delete(&id).await?;
    Ok(accepted(&state, &current.identity, dispatched))
}

fn accepted(
    state: &AppState,
    identity: &Identity,
    dispatched: Dispatched,
) -> (StatusCode, Json<DispatchResponse>) {
    info!(
        action = %dispatched.action,
        id = %dispatched.id,
        name = identity.display_name(),
        "Mutation dispatched"
    );
    state.schedule_refresh();
    (StatusCode::ACCEPTED, Json(DispatchResponse::from(dispatched)))
}

/// Reject drafts without a name or district and respell known districts.
fn prepare_draft(draft: &mut RecordDraft) -> Result<(), AppError> {
    if draft.vendor_name.trim().is_empty() {
        return Err(AppError::BadRequest("vendor_name is required".to_string()));
    }
    if draft.district.trim().is_empty() {
        return Err(AppError::BadRequest("district is required".to_string()));
    }
    if let Some(district) = canonical_district(&draft.district) {
        draft.district = district.to_string();
    }
    Ok(())
}

fn ensure_covers(identity: &Identity, district: &str) -> Result<(), AppError> {
    if identity.covers_district(district) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "district {} is outside your scope",
            district.trim()
        )))
    }
}

/// The record must exist and be visible to `identity`.
async fn ensure_visible(state: &AppState, identity: &Identity, id: &str) -> Result<(), AppError> {
    let snapshot = state.cache().snapshot().await;
    visible_match(&snapshot.records, identity, id)
}

/// Ids are not unique; any visible record carrying `id` is enough.
fn visible_match(records: &[VendorRecord], identity: &Identity, id: &str) -> Result<(), AppError> {
    let mut matches = records.iter().filter(|r| r.id == id).peekable();
    if matches.peek().is_none() {
        return Err(AppError::NotFound(format!("record {id}")));
    }
    if matches.any(|record| identity.can_see(record)) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("record {id} is outside your scope")))
    }
}
