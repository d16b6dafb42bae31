//! Depth-bounded membership resolution.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use idsync_connector::{ExternalIdentity, ExternalIdentityRef, IdentityProvider};

use crate::cleaner::MembershipCleaner;
use crate::delegate::DefaultSyncPath;
use crate::error::SyncResult;
use crate::materializer::GroupMaterializer;
use crate::policy::SyncPolicy;
use crate::store::{LocalPrincipalRecord, LocalStore, MembershipMode};

/// Resolves the flattened set of group principal names reachable from
/// a user's declared groups.
///
/// Recursion is bounded by depth alone: every hop consumes one unit
/// and depth strictly decreases, so no visited-set is kept. Revisiting
/// a group at a shallower depth through another path is legitimate and
/// must not be truncated.
#[derive(Clone)]
pub struct MembershipResolver {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn LocalStore>,
    policy: Arc<SyncPolicy>,
    delegate: Arc<dyn DefaultSyncPath>,
    materializer: GroupMaterializer,
    cleaner: MembershipCleaner,
}

impl MembershipResolver {
    /// Create a resolver over the given collaborators.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn LocalStore>,
        policy: Arc<SyncPolicy>,
        delegate: Arc<dyn DefaultSyncPath>,
        materializer: GroupMaterializer,
        cleaner: MembershipCleaner,
    ) -> Self {
        Self {
            provider,
            store,
            policy,
            delegate,
            materializer,
            cleaner,
        }
    }

    /// Synchronize the membership of a local user record.
    ///
    /// Legacy records stay on the delegated legacy path unless
    /// enforcement is on; everything else gets the flattened
    /// principal-name attribute, optional placeholder groups, and a
    /// one-time legacy cleanup when migrating.
    #[instrument(skip(self, external, record), fields(id = %record.id))]
    pub async fn sync_membership(
        &self,
        external: &ExternalIdentity,
        record: &LocalPrincipalRecord,
        depth: u32,
    ) -> SyncResult<()> {
        if record.is_group {
            return Ok(());
        }

        let legacy = record.mode() == MembershipMode::Legacy;
        if legacy && !self.policy.enforce_dynamic_sync() {
            // Synced before dynamic membership existed; keep the
            // record on the path it was created with.
            return self
                .delegate
                .sync_legacy_membership(external, record, depth)
                .await;
        }

        let declared_groups = external.declared_groups();
        let names = self.collect_principal_names(declared_groups, depth).await;
        self.store
            .set_external_principal_names(&record.id, names)
            .await?;
        self.apply_auto_membership(record);

        if self.policy.dynamic_groups() && depth > 0 {
            self.materializer.ensure_groups(declared_groups, depth).await?;
        }

        if legacy {
            // Names were already captured above; the cleaner's own
            // collection only matters for explicit conversion.
            let _ = self.cleaner.clear(record).await?;
        }
        Ok(())
    }

    /// Collect the principal names of all same-provider groups
    /// reachable from `refs` within `depth` hops.
    ///
    /// `depth == 0` returns the empty set without any provider call.
    /// A lookup failure on one reference aborts only that branch; the
    /// names gathered so far are kept.
    pub async fn collect_principal_names(
        &self,
        refs: &[ExternalIdentityRef],
        depth: u32,
    ) -> HashSet<String> {
        let mut names = HashSet::new();
        if depth > 0 {
            self.collect_into(&mut names, refs, depth).await;
        }
        names
    }

    /// In dynamic mode the auto-membership groups are carried by the
    /// principal-name attribute; materializing them as store
    /// memberships is deliberately omitted.
    pub fn apply_auto_membership(&self, record: &LocalPrincipalRecord) {
        debug!(id = %record.id, "dynamic membership enabled; omitting auto-membership");
    }

    fn collect_into<'a>(
        &'a self,
        names: &'a mut HashSet<String>,
        refs: &'a [ExternalIdentityRef],
        depth: u32,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            // At leaf level a provider with the direct-name capability
            // spares one full fetch per reference.
            let name_resolver = if depth == 1 {
                self.provider.as_principal_name_resolver()
            } else {
                None
            };

            for reference in refs.iter().filter(|r| r.belongs_to(self.provider.name())) {
                if let Some(resolver) = name_resolver {
                    match resolver.principal_name(reference).await {
                        Ok(name) => {
                            names.insert(name);
                        }
                        Err(err) => {
                            warn!(%reference, error = %err,
                                "principal name lookup failed; keeping partial result");
                        }
                    }
                    continue;
                }

                match self.provider.resolve(reference).await {
                    Ok(Some(ExternalIdentity::Group(group))) => {
                        names.insert(group.principal_name.clone());
                        if depth > 1 {
                            self.collect_into(names, &group.declared_groups, depth - 1)
                                .await;
                        }
                    }
                    Ok(Some(other)) => {
                        debug!(%reference, id = other.id(), "reference is not a group; ignored");
                    }
                    Ok(None) => {
                        debug!(%reference, "reference not found in provider; ignored");
                    }
                    Err(err) => {
                        warn!(%reference, error = %err,
                            "group lookup failed; keeping partial result for this branch");
                    }
                }
            }
        })
    }
}
