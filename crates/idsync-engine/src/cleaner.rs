//! Legacy membership cleanup.

use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use idsync_connector::IdentityProvider;

use crate::error::SyncResult;
use crate::policy::SyncPolicy;
use crate::store::{LocalPrincipalRecord, LocalStore};

/// Strips fully-materialized group memberships from a record.
///
/// Used when migrating a record out of legacy mode: walks the record's
/// direct memberships, removes everything this engine owns, and
/// deletes same-provider groups left without members. Memberships that
/// are neither same-provider nor auto-membership are left untouched.
#[derive(Clone)]
pub struct MembershipCleaner {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn LocalStore>,
    policy: Arc<SyncPolicy>,
}

impl MembershipCleaner {
    /// Create a cleaner over the given collaborators.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn LocalStore>,
        policy: Arc<SyncPolicy>,
    ) -> Self {
        Self {
            provider,
            store,
            policy,
        }
    }

    /// Remove the record's legacy group memberships, unwinding nested
    /// legacy membership, and delete groups left orphaned.
    ///
    /// Returns the principal names of the same-provider groups
    /// observed during the walk, for migration bookkeeping.
    #[instrument(skip(self, record), fields(id = %record.id))]
    pub async fn clear(&self, record: &LocalPrincipalRecord) -> SyncResult<HashSet<String>> {
        let mut names = HashSet::new();
        let mut to_remove = BTreeSet::new();
        self.clear_memberships(record, &mut names, &mut to_remove)
            .await?;

        // Deletions are independent of each other.
        for group_id in to_remove {
            if let Err(err) = self.store.delete_group(&group_id).await {
                warn!(group = %group_id, error = %err, "failed to delete orphaned group");
            }
        }
        Ok(names)
    }

    fn clear_memberships<'a>(
        &'a self,
        record: &'a LocalPrincipalRecord,
        names: &'a mut HashSet<String>,
        to_remove: &'a mut BTreeSet<String>,
    ) -> Pin<Box<dyn Future<Output = SyncResult<()>> + Send + 'a>> {
        Box::pin(async move {
            let auto_membership = self.policy.auto_membership(record.is_group);
            for group in self.store.direct_memberships(&record.id).await? {
                if group.from_provider(self.provider.name()) {
                    names.insert(group.principal_name.clone());
                    self.store.remove_member(&group.id, &record.id).await?;
                    self.clear_memberships(&group, names, to_remove).await?;
                    if self.is_orphaned(&group).await? {
                        to_remove.insert(group.id.clone());
                    }
                } else if auto_membership.contains(&group.id) {
                    // Policy-managed, not owned by sync: strip the
                    // membership but never record or delete the group.
                    self.store.remove_member(&group.id, &record.id).await?;
                    self.clear_memberships(&group, names, to_remove).await?;
                } else {
                    debug!(member = %record.id, group = %group.id,
                        "membership not owned by sync; leaving untouched");
                }
            }
            Ok(())
        })
    }

    /// A same-provider group is orphaned once it has no direct members
    /// left, unless dynamic groups are enabled and the placeholder
    /// must survive.
    async fn is_orphaned(&self, group: &LocalPrincipalRecord) -> SyncResult<bool> {
        if self.policy.dynamic_groups() {
            return Ok(false);
        }
        Ok(!self.store.has_direct_members(&group.id).await?)
    }
}
