//! Placeholder group materialization for dynamic-groups mode.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, instrument};

use idsync_connector::{ExternalIdentityRef, IdentityProvider};

use crate::delegate::DefaultSyncPath;
use crate::error::{SyncError, SyncResult};
use crate::store::LocalStore;

/// Creates and refreshes memberless placeholder groups.
///
/// Placeholders carry attributes only; membership always stays on the
/// user side as flattened principal names. Unlike user-side name
/// collection, a provider failure here aborts the whole call: a
/// half-built group graph is retried as a unit on the next cycle.
#[derive(Clone)]
pub struct GroupMaterializer {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn LocalStore>,
    delegate: Arc<dyn DefaultSyncPath>,
}

impl GroupMaterializer {
    /// Create a materializer over the given collaborators.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn LocalStore>,
        delegate: Arc<dyn DefaultSyncPath>,
    ) -> Self {
        Self {
            provider,
            store,
            delegate,
        }
    }

    /// Ensure placeholder groups exist for every same-provider group
    /// reachable from `refs` within `depth` hops, syncing their
    /// attributes on every visit.
    #[instrument(skip(self, refs), fields(count = refs.len()))]
    pub async fn ensure_groups(&self, refs: &[ExternalIdentityRef], depth: u32) -> SyncResult<()> {
        self.ensure_recursive(refs, depth).await
    }

    fn ensure_recursive<'a>(
        &'a self,
        refs: &'a [ExternalIdentityRef],
        depth: u32,
    ) -> Pin<Box<dyn Future<Output = SyncResult<()>> + Send + 'a>> {
        Box::pin(async move {
            for reference in refs.iter().filter(|r| r.belongs_to(self.provider.name())) {
                let Some(identity) = self.provider.resolve(reference).await? else {
                    debug!(%reference, "reference not found in provider; skipping");
                    continue;
                };
                let Some(group) = identity.as_group() else {
                    debug!(%reference, "reference is not a group; skipping");
                    continue;
                };

                let record = match self.store.find_by_id(&group.id).await? {
                    Some(existing) if !existing.is_group => {
                        return Err(SyncError::invalid_identity_kind(&group.id, "group"));
                    }
                    Some(existing) => existing,
                    None => {
                        debug!(group = %group.id, "creating dynamic group placeholder");
                        self.store.create_group(group).await?
                    }
                };

                self.delegate.sync_group_attributes(group, &record).await?;

                if depth > 1 {
                    self.ensure_recursive(&group.declared_groups, depth - 1)
                        .await?;
                }
            }
            Ok(())
        })
    }
}
