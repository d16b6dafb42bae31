//! Local store abstraction and record model.
//!
//! The store is an external collaborator assumed to be atomic per sync
//! call; the engine never manages transactions. Records returned by
//! the store are snapshots; the store remains the source of truth.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use idsync_connector::{ExternalGroup, ExternalIdentityRef};

/// Membership representation mode of a local record.
///
/// Derived once when the record is loaded; the only transition is
/// Legacy to Dynamic via explicit conversion, never the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipMode {
    /// Synced before dynamic membership existed: membership is
    /// materialized as local group objects.
    Legacy,
    /// Membership is flattened into the principal-name attribute.
    /// Records that have never been synced start here.
    Dynamic,
}

impl MembershipMode {
    /// Derive the mode from what the stored record carries.
    ///
    /// The principal-name attribute wins over the timestamp: a record
    /// carrying it is dynamic no matter when it was last synced.
    #[must_use]
    pub fn derive(
        last_synced: Option<&DateTime<Utc>>,
        external_principal_names: Option<&HashSet<String>>,
    ) -> Self {
        if external_principal_names.is_some() {
            MembershipMode::Dynamic
        } else if last_synced.is_some() {
            MembershipMode::Legacy
        } else {
            MembershipMode::Dynamic
        }
    }
}

/// Snapshot of a local user or group record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalPrincipalRecord {
    /// Local id, matching the external identity's id for synced
    /// principals.
    pub id: String,
    /// Name of the principal the record maps to.
    pub principal_name: String,
    /// Whether the record is a group.
    pub is_group: bool,
    /// Reference into the provider the record was synced from, if any.
    pub external_ref: Option<ExternalIdentityRef>,
    /// When the record was last synced.
    pub last_synced: Option<DateTime<Utc>>,
    /// The flattened membership attribute. `None` means the attribute
    /// is absent, which is different from an empty set.
    pub external_principal_names: Option<HashSet<String>>,
    mode: MembershipMode,
}

impl LocalPrincipalRecord {
    /// Build a record snapshot, deriving its membership mode.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        principal_name: impl Into<String>,
        is_group: bool,
        external_ref: Option<ExternalIdentityRef>,
        last_synced: Option<DateTime<Utc>>,
        external_principal_names: Option<HashSet<String>>,
    ) -> Self {
        let mode = MembershipMode::derive(
            last_synced.as_ref(),
            external_principal_names.as_ref(),
        );
        Self {
            id: id.into(),
            principal_name: principal_name.into(),
            is_group,
            external_ref,
            last_synced,
            external_principal_names,
            mode,
        }
    }

    /// Membership mode the record was loaded in.
    #[must_use]
    pub fn mode(&self) -> MembershipMode {
        self.mode
    }

    /// Check whether the record was synced from the named provider.
    #[must_use]
    pub fn from_provider(&self, provider: &str) -> bool {
        self.external_ref
            .as_ref()
            .is_some_and(|r| r.belongs_to(provider))
    }
}

/// Errors raised by the local store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Persistence backend failure.
    #[error("store backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    /// Create a not-found error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Check if a retry on a later sync cycle may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Backend { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The local identity/authorization store.
///
/// Group membership direction as seen from here: the store owns and
/// enumerates which groups a record is a direct member of; the engine
/// never stores member lists on dynamic group placeholders.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Find a record by its local id.
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<LocalPrincipalRecord>>;

    /// Create a memberless placeholder record for an external group.
    async fn create_group(&self, group: &ExternalGroup) -> StoreResult<LocalPrincipalRecord>;

    /// Delete a group record.
    async fn delete_group(&self, id: &str) -> StoreResult<()>;

    /// Replace the flattened membership attribute of a record.
    /// An empty set stores an empty attribute, it does not remove it.
    async fn set_external_principal_names(
        &self,
        id: &str,
        names: HashSet<String>,
    ) -> StoreResult<()>;

    /// Enumerate the groups the record is a direct member of.
    async fn direct_memberships(&self, id: &str) -> StoreResult<Vec<LocalPrincipalRecord>>;

    /// Remove a member from a group.
    async fn remove_member(&self, group_id: &str, member_id: &str) -> StoreResult<()>;

    /// Check whether a group has any remaining direct members.
    async fn has_direct_members(&self, group_id: &str) -> StoreResult<bool>;
}
