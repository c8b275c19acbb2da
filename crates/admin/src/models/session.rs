//! Session-stored login state.

use pkl_monitor_core::Identity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a session remembers about its login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentIdentity {
    pub identity: Identity,
    /// Ticket registered with the application state; used to stop the
    /// poller when the last login ends.
    pub ticket: Uuid,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in identity.
    pub const CURRENT_IDENTITY: &str = "current_identity";
}
