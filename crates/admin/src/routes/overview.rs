//! Overview route: rollup statistics for the logged-in identity.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequireIdentity;
use crate::services::{Rollup, SyncStatus, aggregate, district_detail, scope};
use crate::state::AppState;

/// Build the overview router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/overview", get(overview))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OverviewQuery {
    /// District to drill into.
    pub district: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DistrictDetail {
    pub name: String,
    pub total: usize,
    pub relocated: usize,
    pub not_relocated: usize,
    pub percentage: usize,
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    #[serde(flatten)]
    pub rollup: Rollup,
    /// Present when a district was requested.
    pub district: Option<DistrictDetail>,
    pub sync: SyncStatus,
}

/// Rollup over the identity's visible records.
///
/// GET /api/overview?district=
async fn overview(
    State(state): State<AppState>,
    RequireIdentity(current): RequireIdentity,
    Query(params): Query<OverviewQuery>,
) -> Json<OverviewResponse> {
    let snapshot = state.cache().snapshot().await;
    let visible = scope(&snapshot.records, &current.identity);

    let rollup = aggregate(visible.iter().copied());
    let district = params
        .district
        .filter(|name| !name.trim().is_empty())
        .map(|name| {
            let tally = district_detail(visible.iter().copied(), &name);
            DistrictDetail {
                name: name.trim().to_string(),
                total: tally.total,
                relocated: tally.relocated,
                not_relocated: tally.not_relocated,
                percentage: tally.percentage(),
            }
        });

    Json(OverviewResponse {
        rollup,
        district,
        sync: state.cache().status().await,
    })
}
