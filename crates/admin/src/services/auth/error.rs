//! Authentication error types.

use thiserror::Error;

/// Credentials did not match any entry.
///
/// Deliberately carries no detail about which part was wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid username or password")]
pub struct AuthFailed;
