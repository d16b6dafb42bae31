//! Sync outcome types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use idsync_connector::ExternalIdentityRef;

/// Terminal status of one sync invocation for one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Nothing changed locally.
    Nop,
    /// A local record was materialized.
    Add,
    /// An existing local record was updated.
    Update,
    /// A local record was removed.
    Delete,
    /// The identity belongs to a different provider; nothing was touched.
    Foreign,
}

impl SyncStatus {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Nop => "nop",
            SyncStatus::Add => "add",
            SyncStatus::Update => "update",
            SyncStatus::Delete => "delete",
            SyncStatus::Foreign => "foreign",
        }
    }

    /// Check if the status reflects a local mutation.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(self, SyncStatus::Add | SyncStatus::Update | SyncStatus::Delete)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nop" => Ok(SyncStatus::Nop),
            "add" => Ok(SyncStatus::Add),
            "update" => Ok(SyncStatus::Update),
            "delete" => Ok(SyncStatus::Delete),
            "foreign" => Ok(SyncStatus::Foreign),
            _ => Err(format!("Unknown sync status: {s}")),
        }
    }
}

/// Result of synchronizing a single external identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Id of the synced principal.
    pub id: String,
    /// Reference into the provider the identity came from.
    pub external_ref: ExternalIdentityRef,
    /// Whether the principal is a group.
    pub is_group: bool,
    /// When the local record was last synced. `None` when no local
    /// record was touched (foreign or unmaterialized identities).
    pub last_synced: Option<DateTime<Utc>>,
    /// What happened.
    pub status: SyncStatus,
}

impl SyncOutcome {
    /// Create an outcome for a synced principal.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        external_ref: ExternalIdentityRef,
        is_group: bool,
        last_synced: Option<DateTime<Utc>>,
        status: SyncStatus,
    ) -> Self {
        Self {
            id: id.into(),
            external_ref,
            is_group,
            last_synced,
            status,
        }
    }

    /// Outcome for a group from a different provider. Nothing was
    /// touched locally.
    #[must_use]
    pub fn foreign(id: impl Into<String>, external_ref: ExternalIdentityRef) -> Self {
        Self::new(id, external_ref, true, None, SyncStatus::Foreign)
    }

    /// Outcome for a group that is deliberately not materialized;
    /// its membership lives on users as flattened principal names.
    #[must_use]
    pub fn unmaterialized(id: impl Into<String>, external_ref: ExternalIdentityRef) -> Self {
        Self::new(id, external_ref, true, None, SyncStatus::Nop)
    }
}
