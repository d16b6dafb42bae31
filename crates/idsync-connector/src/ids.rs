//! Provider-scoped identity references.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference to a principal inside a specific identity provider.
///
/// Equality is structural: two references are the same iff both the
/// provider name and the external id match. The reference carries no
/// information about whether the target is a user or a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalIdentityRef {
    provider: String,
    external_id: String,
}

impl ExternalIdentityRef {
    /// Create a reference to `external_id` within `provider`.
    pub fn new(provider: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            external_id: external_id.into(),
        }
    }

    /// Name of the provider this reference belongs to.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Identifier of the principal within the provider.
    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    /// Check whether this reference belongs to the named provider.
    #[must_use]
    pub fn belongs_to(&self, provider: &str) -> bool {
        self.provider == provider
    }
}

impl fmt::Display for ExternalIdentityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.external_id)
    }
}

impl FromStr for ExternalIdentityRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((provider, id)) if !provider.is_empty() && !id.is_empty() => {
                Ok(Self::new(provider, id))
            }
            _ => Err(format!("invalid identity reference: {s}")),
        }
    }
}
