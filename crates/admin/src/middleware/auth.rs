//! Authentication extractors for the dashboard API.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;
use tracing::debug;

use crate::models::{CurrentIdentity, session_keys};
use crate::state::AppState;

/// Extractor that requires a logged-in identity.
///
/// Rejects with 401 and a JSON error body when the session has no identity
/// or its login ticket has lapsed. Each accepted request counts as activity
/// on the ticket.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireIdentity(current): RequireIdentity,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", current.identity.display_name())
/// }
/// ```
pub struct RequireIdentity(pub CurrentIdentity);

/// Error returned when a route needs a login and the session has none.
#[derive(Debug)]
pub struct IdentityRejection;

impl IntoResponse for IdentityRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Not logged in" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireIdentity
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = IdentityRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(IdentityRejection)?;

        let current: CurrentIdentity = session
            .get(session_keys::CURRENT_IDENTITY)
            .await
            .ok()
            .flatten()
            .ok_or(IdentityRejection)?;

        if !AppState::from_ref(state).touch_login(current.ticket).await {
            debug!(name = current.identity.display_name(), "Login ticket lapsed");
            let _ = clear_current_identity(session).await;
            return Err(IdentityRejection);
        }

        Ok(Self(current))
    }
}

/// Extractor that optionally gets the current identity.
///
/// Unlike `RequireIdentity`, this does not reject the request if nobody is
/// logged in.
pub struct OptionalIdentity(pub Option<CurrentIdentity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let current = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentIdentity>(session_keys::CURRENT_IDENTITY)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(current))
    }
}

/// Helper to set the current identity in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_identity(
    session: &Session,
    current: &CurrentIdentity,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_IDENTITY, current).await
}

/// Helper to clear the current identity from the session (logout).
///
/// Returns the identity that was logged in, if any.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_identity(
    session: &Session,
) -> Result<Option<CurrentIdentity>, tower_sessions::session::Error> {
    session
        .remove::<CurrentIdentity>(session_keys::CURRENT_IDENTITY)
        .await
}
