//! Error types for the sheet source and the mutation endpoint.

use thiserror::Error;

use super::gateway::MutationAction;

/// The tabular source could not be read.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level fault (DNS, connect, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The source answered with a non-success status.
    #[error("source returned status {0}")]
    Status(u16),

    /// The response body could not be read as text.
    #[error("unreadable body: {0}")]
    Body(String),
}

/// A mutation could not be handed to the transport.
///
/// This is the only failure the gateway can observe. A mutation the remote
/// script rejects is indistinguishable from one it applied.
#[derive(Debug, Error)]
#[error("failed to dispatch {action}: {source}")]
pub struct DispatchFailed {
    /// Operation that was being sent.
    pub action: MutationAction,
    /// Underlying transport error.
    #[source]
    pub source: reqwest::Error,
}
