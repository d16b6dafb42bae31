//! Engine error types.

use thiserror::Error;

use idsync_connector::ProviderError;

use crate::store::StoreError;

/// Errors that can occur while synchronizing an identity.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Provider lookup failure.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Local store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A local record exists under the external id but with the wrong
    /// kind (user where a group is expected, or vice versa).
    #[error("local record '{id}' exists but is not a {expected}")]
    InvalidIdentityKind { id: String, expected: &'static str },
}

impl SyncError {
    /// Create a kind-conflict error.
    pub fn invalid_identity_kind(id: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidIdentityKind {
            id: id.into(),
            expected,
        }
    }

    /// Check if a retry on a later sync cycle may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Provider(e) => e.is_transient(),
            SyncError::Store(e) => e.is_transient(),
            SyncError::InvalidIdentityKind { .. } => false,
        }
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
