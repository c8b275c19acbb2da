//! HTTP middleware for the dashboard.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with in-memory store)
//! 4. Auth extractors (require a login for `/api/*`)

pub mod auth;
pub mod session;

pub use auth::{
    IdentityRejection, OptionalIdentity, RequireIdentity, clear_current_identity,
    set_current_identity,
};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
