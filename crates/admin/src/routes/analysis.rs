//! AI summary of the currently filtered records.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::gemini::DEFAULT_PROMPT;
use crate::middleware::RequireIdentity;
use crate::services::{RecordQuery, query, scope};
use crate::state::AppState;

/// Build the analysis router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/analysis", post(analyze))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisRequest {
    /// Question for the model; the stock prompt when blank.
    pub prompt: Option<String>,
    #[serde(flatten)]
    pub query: RecordQuery,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub text: String,
    /// Number of records sent to the model.
    pub records: usize,
}

/// Ask Gemini about the visible, filtered records.
///
/// POST /api/analysis
///
/// Model failures come back as a fallback message, not an error status.
async fn analyze(
    State(state): State<AppState>,
    RequireIdentity(current): RequireIdentity,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let Some(gemini) = state.gemini() else {
        return Err(AppError::BadRequest(
            "AI summaries are not configured".to_string(),
        ));
    };

    let snapshot = state.cache().snapshot().await;
    let visible = scope(&snapshot.records, &current.identity);
    let filtered = query(visible.iter().copied(), &request.query);

    let prompt = request
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PROMPT);

    info!(
        records = filtered.len(),
        name = current.identity.display_name(),
        "Requesting AI summary"
    );
    let text = gemini.analyze(&filtered, prompt).await;

    Ok(Json(AnalysisResponse {
        text,
        records: filtered.len(),
    }))
}
