//! External identity snapshots.
//!
//! Identities are read-only values produced by a provider per call.
//! The engine never caches them across sync invocations, so there is
//! no freshness or invalidation machinery here.

use serde::{Deserialize, Serialize};

use crate::ids::ExternalIdentityRef;

/// A user as seen by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalUser {
    /// Provider-local id, stable across syncs.
    pub id: String,
    /// Name of the principal this user maps to.
    pub principal_name: String,
    /// Reference back into the provider.
    pub external_ref: ExternalIdentityRef,
    /// Groups this user is directly declared a member of, in provider
    /// order.
    pub declared_groups: Vec<ExternalIdentityRef>,
}

/// A group as seen by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalGroup {
    /// Provider-local id, stable across syncs.
    pub id: String,
    /// Name of the principal this group maps to.
    pub principal_name: String,
    /// Reference back into the provider.
    pub external_ref: ExternalIdentityRef,
    /// Groups this group is directly declared a member of, in provider
    /// order.
    pub declared_groups: Vec<ExternalIdentityRef>,
}

/// A principal snapshot fetched from a provider.
///
/// Closed union: providers hand the engine users and groups, nothing
/// else. Anything the provider cannot classify must be reported as
/// not-found rather than smuggled through a third variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExternalIdentity {
    /// A user principal.
    User(ExternalUser),
    /// A group principal.
    Group(ExternalGroup),
}

impl ExternalIdentity {
    /// Provider-local id of the principal.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            ExternalIdentity::User(u) => &u.id,
            ExternalIdentity::Group(g) => &g.id,
        }
    }

    /// Principal name of the identity.
    #[must_use]
    pub fn principal_name(&self) -> &str {
        match self {
            ExternalIdentity::User(u) => &u.principal_name,
            ExternalIdentity::Group(g) => &g.principal_name,
        }
    }

    /// Reference back into the provider.
    #[must_use]
    pub fn external_ref(&self) -> &ExternalIdentityRef {
        match self {
            ExternalIdentity::User(u) => &u.external_ref,
            ExternalIdentity::Group(g) => &g.external_ref,
        }
    }

    /// Directly declared group memberships.
    #[must_use]
    pub fn declared_groups(&self) -> &[ExternalIdentityRef] {
        match self {
            ExternalIdentity::User(u) => &u.declared_groups,
            ExternalIdentity::Group(g) => &g.declared_groups,
        }
    }

    /// Check whether this identity is a group.
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, ExternalIdentity::Group(_))
    }

    /// Borrow the group payload, if this is a group.
    #[must_use]
    pub fn as_group(&self) -> Option<&ExternalGroup> {
        match self {
            ExternalIdentity::Group(g) => Some(g),
            ExternalIdentity::User(_) => None,
        }
    }
}

impl From<ExternalUser> for ExternalIdentity {
    fn from(user: ExternalUser) -> Self {
        ExternalIdentity::User(user)
    }
}

impl From<ExternalGroup> for ExternalIdentity {
    fn from(group: ExternalGroup) -> Self {
        ExternalIdentity::Group(group)
    }
}
