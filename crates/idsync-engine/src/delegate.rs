//! Delegated default sync path.
//!
//! The engine extends a pre-existing full synchronization
//! implementation for everything that is not membership: user
//! creation and attribute updates, group attribute updates, and the
//! legacy fully-materialized membership sync kept for back
//! compatibility. That implementation stays behind this trait.

use async_trait::async_trait;

use idsync_connector::{ExternalGroup, ExternalIdentity, ExternalUser};

use crate::error::SyncResult;
use crate::outcome::{SyncOutcome, SyncStatus};
use crate::store::LocalPrincipalRecord;

/// The default (pre-dynamic) synchronization path.
#[async_trait]
pub trait DefaultSyncPath: Send + Sync {
    /// Run the default user sync: create the local record if needed
    /// and sync its non-membership attributes.
    ///
    /// Must not stamp `last_synced` on records it creates; the default
    /// path stamps as its final step, which with this engine is after
    /// membership resolution. Pre-stamping would make a fresh record
    /// look like a legacy one.
    async fn sync_user(&self, user: &ExternalUser) -> SyncResult<SyncOutcome>;

    /// Sync the non-membership attributes of an existing local group.
    /// Never touches member lists.
    async fn sync_group_attributes(
        &self,
        group: &ExternalGroup,
        record: &LocalPrincipalRecord,
    ) -> SyncResult<SyncStatus>;

    /// Run the legacy fully-materialized membership sync for a record
    /// that predates dynamic membership.
    async fn sync_legacy_membership(
        &self,
        external: &ExternalIdentity,
        record: &LocalPrincipalRecord,
        depth: u32,
    ) -> SyncResult<()>;
}
