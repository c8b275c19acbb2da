//! HTTP route handlers for the dashboard API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                 - Liveness check
//!
//! # Auth
//! POST   /auth/login             - Log in with username/password
//! POST   /auth/logout            - Log out
//! GET    /api/me                 - Current identity
//!
//! # Overview
//! GET    /api/overview           - Rollup, optional district detail, sync status
//!
//! # Records
//! GET    /api/records            - Filtered list (q, district, status)
//! POST   /api/records            - Create (dispatched)
//! PUT    /api/records/{id}       - Update (dispatched)
//! DELETE /api/records/{id}       - Delete (dispatched)
//!
//! # Sync
//! GET    /api/sync               - Sync status
//! POST   /api/sync               - Foreground refresh
//!
//! # AI
//! POST   /api/analysis           - Gemini summary of the filtered list
//! ```
//!
//! Every `/api/*` read goes through [`scope`](crate::services::scope) first.

pub mod analysis;
pub mod auth;
pub mod overview;
pub mod records;
pub mod sync;

use axum::{Router, routing::get};

use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Build the full application router with sessions and state attached.
pub fn router(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(overview::router())
        .merge(records::router())
        .merge(sync::router())
        .merge(analysis::router())
        .layer(session_layer)
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the sheet.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::state::tests::test_config;

    pub(crate) const ADMIN_PASSWORD: &str = "aB3$xY9!mK2@nL5#";

    pub(crate) fn test_app(overrides: &[(&str, &str)]) -> (Router, AppState) {
        let state = AppState::new(test_config(overrides)).unwrap();
        (router(state.clone()), state)
    }

    pub(crate) async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub(crate) fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    pub(crate) fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    /// Log in and return the session cookie (`name=value`).
    pub(crate) async fn login(app: &Router, username: &str, password: &str) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/auth/login",
                None,
                &serde_json::json!({ "username": username, "password": password }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app(&[]);
        let response = app.oneshot(get_request("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_requires_login() {
        let (app, _) = test_app(&[]);
        for uri in ["/api/me", "/api/overview", "/api/records", "/api/sync"] {
            let response = app.clone().oneshot(get_request(uri, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }
}
