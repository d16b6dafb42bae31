//! Top-level sync entry point.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};

use idsync_connector::{ExternalGroup, ExternalIdentity, IdentityProvider};

use crate::cleaner::MembershipCleaner;
use crate::delegate::DefaultSyncPath;
use crate::error::{SyncError, SyncResult};
use crate::materializer::GroupMaterializer;
use crate::outcome::{SyncOutcome, SyncStatus};
use crate::policy::SyncPolicy;
use crate::resolver::MembershipResolver;
use crate::store::{LocalPrincipalRecord, LocalStore, MembershipMode};

/// Dynamic-membership synchronization engine for one provider.
///
/// Classifies incoming external identities and coordinates the
/// resolver, materializer and cleaner around the delegated default
/// sync path. One instance serves one provider; references carrying a
/// different provider name resolve to [`SyncStatus::Foreign`].
pub struct SyncEngine {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn LocalStore>,
    policy: Arc<SyncPolicy>,
    delegate: Arc<dyn DefaultSyncPath>,
    resolver: MembershipResolver,
    cleaner: MembershipCleaner,
}

impl SyncEngine {
    /// Create an engine over the given collaborators.
    pub fn new(
        policy: SyncPolicy,
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn LocalStore>,
        delegate: Arc<dyn DefaultSyncPath>,
    ) -> Self {
        let policy = Arc::new(policy);
        let materializer =
            GroupMaterializer::new(provider.clone(), store.clone(), delegate.clone());
        let cleaner = MembershipCleaner::new(provider.clone(), store.clone(), policy.clone());
        let resolver = MembershipResolver::new(
            provider.clone(),
            store.clone(),
            policy.clone(),
            delegate.clone(),
            materializer,
            cleaner.clone(),
        );
        Self {
            provider,
            store,
            policy,
            delegate,
            resolver,
            cleaner,
        }
    }

    /// The membership resolver driving the user-side flattening.
    #[must_use]
    pub fn resolver(&self) -> &MembershipResolver {
        &self.resolver
    }

    /// The policy this engine runs under.
    #[must_use]
    pub fn policy(&self) -> &SyncPolicy {
        &self.policy
    }

    /// Synchronize one external identity.
    ///
    /// Users are delegated to the default sync path for attributes and
    /// then run through membership resolution; the delegate's outcome
    /// is returned unchanged. Groups from a different provider return
    /// [`SyncStatus::Foreign`] without touching the store.
    #[instrument(skip(self, identity), fields(id = identity.id()))]
    pub async fn sync(&self, identity: &ExternalIdentity) -> SyncResult<SyncOutcome> {
        match identity {
            ExternalIdentity::User(user) => {
                let outcome = self.delegate.sync_user(user).await?;
                match self.store.find_by_id(&user.id).await? {
                    Some(record) if record.is_group => {
                        Err(SyncError::invalid_identity_kind(&user.id, "user"))
                    }
                    Some(record) => {
                        self.resolver
                            .sync_membership(
                                identity,
                                &record,
                                self.policy.user.membership_nesting_depth,
                            )
                            .await?;
                        Ok(outcome)
                    }
                    None => Ok(outcome),
                }
            }
            ExternalIdentity::Group(group) => {
                if !group.external_ref.belongs_to(self.provider.name()) {
                    debug!(reference = %group.external_ref, "foreign provider; not synchronized");
                    return Ok(SyncOutcome::foreign(&group.id, group.external_ref.clone()));
                }
                self.sync_group(group).await
            }
        }
    }

    /// Synchronize a same-provider external group.
    ///
    /// An already-materialized group is always kept consistent through
    /// the default attribute sync, independent of the dynamic-groups
    /// policy. A new group is materialized only when dynamic groups
    /// are enabled; otherwise its membership lives purely on users.
    async fn sync_group(&self, group: &ExternalGroup) -> SyncResult<SyncOutcome> {
        match self.store.find_by_id(&group.id).await? {
            Some(record) if !record.is_group => {
                Err(SyncError::invalid_identity_kind(&group.id, "group"))
            }
            Some(record) => {
                let status = self.delegate.sync_group_attributes(group, &record).await?;
                Ok(SyncOutcome::new(
                    &group.id,
                    group.external_ref.clone(),
                    true,
                    Some(Utc::now()),
                    status,
                ))
            }
            None if self.policy.dynamic_groups() => {
                debug!(group = %group.id, "synchronizing as dynamic group");
                let record = self.store.create_group(group).await?;
                self.delegate.sync_group_attributes(group, &record).await?;
                Ok(SyncOutcome::new(
                    &group.id,
                    group.external_ref.clone(),
                    true,
                    Some(Utc::now()),
                    SyncStatus::Add,
                ))
            }
            None => {
                debug!(group = %group.id,
                    "not materialized; membership is represented on users only");
                Ok(SyncOutcome::unmaterialized(
                    &group.id,
                    group.external_ref.clone(),
                ))
            }
        }
    }

    /// Migrate a legacy user record to dynamic membership.
    ///
    /// Strips its materialized memberships and stores the observed
    /// same-provider group names as the flattened attribute. Returns
    /// `false` without touching anything for groups and for records
    /// not in legacy mode.
    #[instrument(skip(self, record), fields(id = %record.id))]
    pub async fn convert_to_dynamic_membership(
        &self,
        record: &LocalPrincipalRecord,
    ) -> SyncResult<bool> {
        if record.is_group || record.mode() != MembershipMode::Legacy {
            return Ok(false);
        }

        let names = self.cleaner.clear(record).await?;
        self.store
            .set_external_principal_names(&record.id, names)
            .await?;
        Ok(true)
    }
}
