//! Error taxonomy for the session controller.

use thiserror::Error;

use crate::types::SessionPhase;

/// Failure reported by the environment when acquiring a media stream.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaAccessError {
    /// The user or environment declined access. Retryable.
    #[error("permission denied")]
    PermissionDenied,

    /// The hosting environment has no capture capability at all.
    #[error("media capture unsupported: {0}")]
    Unsupported(String),

    #[error("{0}")]
    Other(String),
}

impl MediaAccessError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

/// Screen-share acquisition failed; the session continues without sharing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("screen share failed: {0}")]
pub struct ShareError(#[from] pub MediaAccessError);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("participant id already present: {0}")]
    DuplicateId(String),
}

/// Errors returned from controller entry points.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("missing meeting ID or token")]
    MissingCredentials,

    #[error("not allowed while session is {0}")]
    InvalidPhase(SessionPhase),

    #[error(transparent)]
    Roster(#[from] RosterError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_permission_denied_is_retryable() {
        assert!(MediaAccessError::PermissionDenied.is_retryable());
        assert!(!MediaAccessError::Unsupported("no devices".into()).is_retryable());
        assert!(!MediaAccessError::Other("busy".into()).is_retryable());
    }

    #[test]
    fn test_share_error_wraps_access_error() {
        let err = ShareError::from(MediaAccessError::PermissionDenied);
        assert_eq!(err.to_string(), "screen share failed: permission denied");
    }
}
