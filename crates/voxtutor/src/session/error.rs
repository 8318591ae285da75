//! Session error types.

use thiserror::Error;

use super::types::SessionStatus;
use crate::store::StorageError;
use crate::vendor::VendorError;

/// Errors that can occur during session lifecycle operations.
///
/// Vendor failures are surfaced without retry and leave session state
/// unchanged, so callers may safely retry the whole operation.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Remote vendor call failed.
    #[error("vendor unavailable: {0}")]
    VendorUnavailable(#[from] VendorError),

    /// Target session is absent from the active registry.
    #[error("session not found: {0}")]
    NotFound(String),

    /// Session exists but belongs to a different user.
    #[error("session {0} is not owned by the caller")]
    Unauthorized(String),

    /// Requested transition is not allowed from the current status.
    #[error("invalid transition {from} -> {to} for session {session_id}")]
    InvalidTransition {
        session_id: String,
        from: SessionStatus,
        to: SessionStatus,
    },

    /// Storage read or write failed.
    #[error("persistence failure: {0}")]
    Persistence(#[from] StorageError),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

impl SessionError {
    /// Create an invalid-transition error.
    pub fn invalid_transition(
        session_id: impl Into<String>,
        from: SessionStatus,
        to: SessionStatus,
    ) -> Self {
        Self::InvalidTransition {
            session_id: session_id.into(),
            from,
            to,
        }
    }
}
