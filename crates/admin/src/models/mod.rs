//! Session models for the dashboard.

pub mod session;

pub use session::CurrentIdentity;
pub use session::keys as session_keys;
