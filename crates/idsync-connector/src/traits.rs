//! Identity provider traits.
//!
//! Capability-based: every provider implements [`IdentityProvider`];
//! providers that can map a reference straight to a principal name
//! additionally implement [`PrincipalNameResolver`] and advertise it
//! through [`IdentityProvider::as_principal_name_resolver`].

use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::ids::ExternalIdentityRef;
use crate::types::ExternalIdentity;

/// A system of record for users and groups.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Name of this provider. References carrying a different provider
    /// name are foreign to this provider and must not be resolved
    /// through it.
    fn name(&self) -> &str;

    /// Resolve a reference to its identity snapshot.
    ///
    /// Returns `Ok(None)` when the reference does not exist in the
    /// provider. Transport failures surface as errors.
    async fn resolve(&self, reference: &ExternalIdentityRef)
        -> ProviderResult<Option<ExternalIdentity>>;

    /// Advertise the direct principal-name capability, if supported.
    ///
    /// Callers resolving leaf-level names may use the returned resolver
    /// to avoid a full identity fetch per reference.
    fn as_principal_name_resolver(&self) -> Option<&dyn PrincipalNameResolver> {
        None
    }
}

/// Capability for mapping a reference to its principal name without
/// fetching the full identity.
#[async_trait]
pub trait PrincipalNameResolver: Send + Sync {
    /// Principal name the reference would resolve to.
    async fn principal_name(&self, reference: &ExternalIdentityRef) -> ProviderResult<String>;
}
