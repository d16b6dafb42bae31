//! # Identity Provider Abstraction
//!
//! External-system surface for the idsync engine.
//!
//! This crate defines what the synchronization engine needs from an
//! identity provider and nothing more:
//!
//! - [`ExternalIdentityRef`] - provider-scoped reference to a principal
//! - [`ExternalIdentity`] - read-only snapshot of a user or group
//! - [`IdentityProvider`] - resolution of references to identities
//! - [`PrincipalNameResolver`] - optional capability mapping a
//!   reference straight to its principal name without a full fetch
//!
//! Transport, paging, schema discovery and credential handling live in
//! concrete provider implementations, not here.

pub mod error;
pub mod ids;
pub mod traits;
pub mod types;

pub use error::{ProviderError, ProviderResult};
pub use ids::ExternalIdentityRef;
pub use traits::{IdentityProvider, PrincipalNameResolver};
pub use types::{ExternalGroup, ExternalIdentity, ExternalUser};
