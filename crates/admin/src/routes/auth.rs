//! Authentication route handlers.
//!
//! Username/password login against the credential store. A successful
//! login registers a ticket with the application state, which keeps the
//! background poller running while anyone is logged in.

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use pkl_monitor_core::{DEFAULT_DISTRICT, DISTRICTS, Identity};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{
    OptionalIdentity, RequireIdentity, clear_current_identity, set_current_identity,
};
use crate::models::CurrentIdentity;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/api/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Identity as shown to the dashboard.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub identity: Identity,
    pub display_name: String,
    /// Districts this identity can pick in filters and forms.
    pub districts: Vec<&'static str>,
    /// District pre-selected on the create form.
    pub default_district: &'static str,
}

impl From<&Identity> for MeResponse {
    fn from(identity: &Identity) -> Self {
        let districts: Vec<&'static str> = DISTRICTS
            .into_iter()
            .filter(|d| identity.covers_district(d))
            .collect();
        let default_district = districts.first().copied().unwrap_or(DEFAULT_DISTRICT);

        Self {
            identity: identity.clone(),
            display_name: identity.display_name().to_string(),
            districts,
            default_district,
        }
    }
}

/// Log in.
///
/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    session: Session,
    OptionalIdentity(previous): OptionalIdentity,
    Json(request): Json<LoginRequest>,
) -> Result<Json<MeResponse>, AppError> {
    let identity = state
        .credentials()
        .authenticate(&request.username, &request.password)
        .inspect_err(|_| warn!(username = %request.username, "Login rejected"))?;

    // Logging in again on the same session replaces the old login.
    if let Some(previous) = previous {
        state.end_login(previous.ticket).await;
    }

    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("Session error: {e}")))?;

    let ticket = state.begin_login().await;
    let current = CurrentIdentity {
        identity: identity.clone(),
        ticket,
    };
    if let Err(e) = set_current_identity(&session, &current).await {
        state.end_login(ticket).await;
        return Err(AppError::Internal(format!("Session error: {e}")));
    }

    set_sentry_user(identity.display_name(), &identity.role().to_string());
    info!(role = %identity.role(), name = identity.display_name(), "Login accepted");

    Ok(Json(MeResponse::from(&identity)))
}

/// Log out and clear the session.
///
/// POST /auth/logout
async fn logout(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    if let Ok(Some(current)) = clear_current_identity(&session).await {
        state.end_login(current.ticket).await;
        info!(role = %current.identity.role(), name = current.identity.display_name(), "Logout");
    }
    let _ = session.flush().await;
    clear_sentry_user();

    Json(json!({ "logged_out": true }))
}

/// Current identity.
///
/// GET /api/me
async fn me(RequireIdentity(current): RequireIdentity) -> Json<MeResponse> {
    Json(MeResponse::from(&current.identity))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::routes::tests::{
        ADMIN_PASSWORD, body_json, get_request, json_request, login, test_app,
    };

    #[tokio::test]
    async fn test_login_elevated() {
        let (app, state) = test_app(&[]);
        let cookie = login(&app, "admin", ADMIN_PASSWORD).await;
        assert!(state.is_polling().await);

        let response = app.oneshot(get_request("/api/me", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["role"], "elevated");
        assert_eq!(body["username"], "admin");
        assert_eq!(body["districts"].as_array().unwrap().len(), DISTRICTS.len());
        assert_eq!(body["default_district"], "Baru");
    }

    #[tokio::test]
    async fn test_login_scoped() {
        let (app, _) = test_app(&[]);
        let cookie = login(&app, "PisangSelatan", "pisangselatan").await;

        let body = body_json(app.oneshot(get_request("/api/me", Some(&cookie))).await.unwrap()).await;
        assert_eq!(body["role"], "scoped");
        assert_eq!(body["district"], "Pisang Selatan");
        assert_eq!(body["districts"], json!(["Pisang Selatan"]));
        assert_eq!(body["default_district"], "Pisang Selatan");
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let (app, state) = test_app(&[]);
        let response = app
            .oneshot(json_request(
                "POST",
                "/auth/login",
                None,
                &json!({ "username": "admin", "password": "wrong" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!state.is_polling().await);
    }

    #[tokio::test]
    async fn test_logout_stops_poller_and_clears_session() {
        let (app, state) = test_app(&[]);
        let cookie = login(&app, "baru", "baru").await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/auth/logout", Some(&cookie), &json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!state.is_polling().await);
        assert_eq!(state.active_logins().await, 0);

        let response = app.oneshot(get_request("/api/me", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_relogin_on_same_session_replaces_ticket() {
        let (app, state) = test_app(&[]);
        let cookie = login(&app, "baru", "baru").await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/auth/login",
                Some(&cookie),
                &json!({ "username": "losari", "password": "losari" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.active_logins().await, 1);
    }

    #[tokio::test]
    async fn test_lapsed_ticket_rejected() {
        let (app, state) = test_app(&[]);
        let cookie = login(&app, "baru", "baru").await;

        let response = app.clone().oneshot(get_request("/api/me", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Dropping every ticket leaves the session cookie in place.
        state.shutdown().await;
        let response = app.oneshot(get_request("/api/me", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!state.is_polling().await);
    }
}
