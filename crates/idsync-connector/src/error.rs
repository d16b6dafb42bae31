//! Provider error types.

use thiserror::Error;

use crate::ids::ExternalIdentityRef;

/// Errors raised by an identity provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider could not be reached.
    #[error("provider unreachable: {message}")]
    Unreachable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The reference could not be resolved to an identity.
    #[error("lookup failed for {reference}: {message}")]
    Lookup {
        reference: ExternalIdentityRef,
        message: String,
    },

    /// The provider returned data the caller cannot use.
    #[error("invalid identity data: {message}")]
    InvalidData { message: String },
}

impl ProviderError {
    /// Create an unreachable error.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
            source: None,
        }
    }

    /// Create a lookup error for a specific reference.
    pub fn lookup(reference: ExternalIdentityRef, message: impl Into<String>) -> Self {
        Self::Lookup {
            reference,
            message: message.into(),
        }
    }

    /// Create an invalid-data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Check if a retry on a later sync cycle may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Unreachable { .. } | ProviderError::Lookup { .. }
        )
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
