//! Session middleware configuration for the dashboard.
//!
//! Sessions live in memory: identities are not persisted across restarts.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::DashboardConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "pkl_dashboard_session";

/// Create the session layer with an in-memory store.
///
/// Sessions expire after `config.auth.session_expiry` of inactivity, the
/// same idle limit the login tickets use. Cookies are marked `Secure`
/// unless the server binds to a loopback address.
#[must_use]
pub fn create_session_layer(config: &DashboardConfig) -> SessionManagerLayer<MemoryStore> {
    let is_secure = !config.host.is_loopback();
    let expiry_secs = i64::try_from(config.auth.session_expiry.as_secs()).unwrap_or(i64::MAX);

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(expiry_secs),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
