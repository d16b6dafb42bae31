//! Sync policy configuration.
//!
//! Per-principal-type settings consulted by every engine component.
//! Pure data; loading it from a config file is the caller's concern.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// User-side sync settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPolicy {
    /// Ids of local groups every synced user is automatically made a
    /// member of by the default sync path. The cleaner strips these
    /// memberships during migration but never deletes the groups.
    pub auto_membership: HashSet<String>,
    /// Maximum number of nested group hops resolved per sync.
    pub membership_nesting_depth: u32,
    /// Store membership as flattened principal names on the user.
    ///
    /// Read by the sync handler when choosing whether to route a
    /// provider through this engine at all; once an engine instance
    /// exists, per-record mode selection uses
    /// [`SyncPolicy::enforce_dynamic_sync`] and the record's own mode.
    pub dynamic_membership: bool,
    /// Apply dynamic membership even to records synced before the
    /// feature was enabled.
    pub enforce_dynamic_membership: bool,
}

/// Group-side sync settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupPolicy {
    /// Auto-membership group ids applicable when the synced principal
    /// is itself a group.
    pub auto_membership: HashSet<String>,
    /// Materialize memberless placeholder groups alongside the
    /// flattened principal names.
    pub dynamic_groups: bool,
}

/// Complete sync policy for one provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncPolicy {
    /// User-side settings.
    pub user: UserPolicy,
    /// Group-side settings.
    pub group: GroupPolicy,
}

impl SyncPolicy {
    /// Whether placeholder groups are materialized.
    #[must_use]
    pub fn dynamic_groups(&self) -> bool {
        self.group.dynamic_groups
    }

    /// Whether records synced before dynamic membership existed are
    /// pulled onto the dynamic path instead of the legacy one.
    #[must_use]
    pub fn enforce_dynamic_sync(&self) -> bool {
        self.user.enforce_dynamic_membership || self.group.dynamic_groups
    }

    /// Auto-membership set applicable to a principal of the given type.
    #[must_use]
    pub fn auto_membership(&self, is_group: bool) -> &HashSet<String> {
        if is_group {
            &self.group.auto_membership
        } else {
            &self.user.auto_membership
        }
    }
}
