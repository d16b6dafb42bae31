//! Shared fixtures: an in-memory store, a scriptable provider and a
//! recording default-sync delegate.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use idsync_connector::{
    ExternalGroup, ExternalIdentity, ExternalIdentityRef, ExternalUser, IdentityProvider,
    PrincipalNameResolver, ProviderError, ProviderResult,
};
use idsync_engine::{
    DefaultSyncPath, LocalPrincipalRecord, LocalStore, StoreError, StoreResult, SyncEngine,
    SyncOutcome, SyncPolicy, SyncResult as EngineResult, SyncStatus,
};

pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn ext_ref(provider: &str, id: &str) -> ExternalIdentityRef {
    ExternalIdentityRef::new(provider, id)
}

pub fn ext_user(provider: &str, id: &str, groups: &[&str]) -> ExternalUser {
    ExternalUser {
        id: id.to_string(),
        principal_name: id.to_string(),
        external_ref: ext_ref(provider, id),
        declared_groups: groups.iter().map(|g| ext_ref(provider, g)).collect(),
    }
}

pub fn ext_group(provider: &str, id: &str, groups: &[&str]) -> ExternalGroup {
    ExternalGroup {
        id: id.to_string(),
        principal_name: id.to_string(),
        external_ref: ext_ref(provider, id),
        declared_groups: groups.iter().map(|g| ext_ref(provider, g)).collect(),
    }
}

/// Scriptable identity provider keyed by external id, with optional
/// failure injection and an optional direct principal-name capability.
pub struct MockProvider {
    name: String,
    identities: Mutex<HashMap<String, ExternalIdentity>>,
    failing: Mutex<HashSet<String>>,
    shortcut: bool,
    resolve_calls: AtomicUsize,
    name_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            identities: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            shortcut: false,
            resolve_calls: AtomicUsize::new(0),
            name_calls: AtomicUsize::new(0),
        }
    }

    /// Enable the direct principal-name capability.
    pub fn with_shortcut(mut self) -> Self {
        self.shortcut = true;
        self
    }

    pub fn add_group(&self, group: ExternalGroup) {
        self.identities
            .lock()
            .unwrap()
            .insert(group.id.clone(), ExternalIdentity::Group(group));
    }

    /// Make every lookup of this external id fail.
    pub fn fail_on(&self, external_id: &str) {
        self.failing.lock().unwrap().insert(external_id.to_string());
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn name_calls(&self) -> usize {
        self.name_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self, reference: &ExternalIdentityRef) -> ProviderResult<()> {
        if self.failing.lock().unwrap().contains(reference.external_id()) {
            Err(ProviderError::lookup(reference.clone(), "injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(
        &self,
        reference: &ExternalIdentityRef,
    ) -> ProviderResult<Option<ExternalIdentity>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure(reference)?;
        Ok(self
            .identities
            .lock()
            .unwrap()
            .get(reference.external_id())
            .cloned())
    }

    fn as_principal_name_resolver(&self) -> Option<&dyn PrincipalNameResolver> {
        if self.shortcut {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl PrincipalNameResolver for MockProvider {
    async fn principal_name(&self, reference: &ExternalIdentityRef) -> ProviderResult<String> {
        self.name_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure(reference)?;
        self.identities
            .lock()
            .unwrap()
            .get(reference.external_id())
            .map(|identity| identity.principal_name().to_string())
            .ok_or_else(|| ProviderError::lookup(reference.clone(), "unknown reference"))
    }
}

#[derive(Clone)]
struct StoredRecord {
    principal_name: String,
    is_group: bool,
    external_ref: Option<ExternalIdentityRef>,
    last_synced: Option<DateTime<Utc>>,
    names: Option<HashSet<String>>,
    members: HashSet<String>,
}

impl StoredRecord {
    fn snapshot(&self, id: &str) -> LocalPrincipalRecord {
        LocalPrincipalRecord::new(
            id,
            self.principal_name.clone(),
            self.is_group,
            self.external_ref.clone(),
            self.last_synced,
            self.names.clone(),
        )
    }
}

/// In-memory local store with optional failure injection.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, StoredRecord>>,
    failing_deletes: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every deletion of this group fail with a backend error.
    pub fn fail_delete_on(&self, group_id: &str) {
        self.failing_deletes
            .lock()
            .unwrap()
            .insert(group_id.to_string());
    }

    pub fn insert_user(
        &self,
        id: &str,
        external_ref: Option<ExternalIdentityRef>,
        last_synced: Option<DateTime<Utc>>,
        names: Option<HashSet<String>>,
    ) {
        self.inner.lock().unwrap().insert(
            id.to_string(),
            StoredRecord {
                principal_name: id.to_string(),
                is_group: false,
                external_ref,
                last_synced,
                names,
                members: HashSet::new(),
            },
        );
    }

    pub fn insert_group(&self, id: &str, external_ref: Option<ExternalIdentityRef>) {
        self.inner.lock().unwrap().insert(
            id.to_string(),
            StoredRecord {
                principal_name: id.to_string(),
                is_group: true,
                external_ref,
                last_synced: None,
                names: None,
                members: HashSet::new(),
            },
        );
    }

    pub fn add_membership(&self, group_id: &str, member_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        let group = inner.get_mut(group_id).expect("group must exist");
        group.members.insert(member_id.to_string());
    }

    pub fn record(&self, id: &str) -> Option<LocalPrincipalRecord> {
        self.inner.lock().unwrap().get(id).map(|r| r.snapshot(id))
    }

    pub fn names_of(&self, id: &str) -> Option<HashSet<String>> {
        self.inner
            .lock()
            .unwrap()
            .get(id)
            .and_then(|r| r.names.clone())
    }

    pub fn group_exists(&self, id: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .get(id)
            .is_some_and(|r| r.is_group)
    }

    pub fn member_ids(&self, group_id: &str) -> HashSet<String> {
        self.inner
            .lock()
            .unwrap()
            .get(group_id)
            .map(|r| r.members.clone())
            .unwrap_or_default()
    }

    pub fn record_count(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<LocalPrincipalRecord>> {
        Ok(self.record(id))
    }

    async fn create_group(&self, group: &ExternalGroup) -> StoreResult<LocalPrincipalRecord> {
        self.insert_group(&group.id, Some(group.external_ref.clone()));
        Ok(self.record(&group.id).expect("just inserted"))
    }

    async fn delete_group(&self, id: &str) -> StoreResult<()> {
        if self.failing_deletes.lock().unwrap().contains(id) {
            return Err(StoreError::backend(format!("injected failure deleting {id}")));
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.remove(id).is_none() {
            return Err(StoreError::not_found("group", id));
        }
        for record in inner.values_mut() {
            record.members.remove(id);
        }
        Ok(())
    }

    async fn set_external_principal_names(
        &self,
        id: &str,
        names: HashSet<String>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("record", id))?;
        record.names = Some(names);
        Ok(())
    }

    async fn direct_memberships(&self, id: &str) -> StoreResult<Vec<LocalPrincipalRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .iter()
            .filter(|(_, r)| r.members.contains(id))
            .map(|(gid, r)| r.snapshot(gid))
            .collect())
    }

    async fn remove_member(&self, group_id: &str, member_id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let group = inner
            .get_mut(group_id)
            .ok_or_else(|| StoreError::not_found("group", group_id))?;
        group.members.remove(member_id);
        Ok(())
    }

    async fn has_direct_members(&self, group_id: &str) -> StoreResult<bool> {
        let inner = self.inner.lock().unwrap();
        let group = inner
            .get(group_id)
            .ok_or_else(|| StoreError::not_found("group", group_id))?;
        Ok(!group.members.is_empty())
    }
}

/// Default sync path that records every call it receives.
pub struct RecordingDelegate {
    store: Arc<MemoryStore>,
    calls: Mutex<Vec<String>>,
}

impl RecordingDelegate {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record_call(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DefaultSyncPath for RecordingDelegate {
    async fn sync_user(&self, user: &ExternalUser) -> EngineResult<SyncOutcome> {
        self.record_call(format!("user:{}", user.id));
        let existed = self.store.record(&user.id).is_some();
        if !existed {
            // Created without a timestamp; the default path stamps
            // after membership resolution.
            self.store
                .insert_user(&user.id, Some(user.external_ref.clone()), None, None);
        }
        let status = if existed {
            SyncStatus::Update
        } else {
            SyncStatus::Add
        };
        Ok(SyncOutcome::new(
            &user.id,
            user.external_ref.clone(),
            false,
            Some(Utc::now()),
            status,
        ))
    }

    async fn sync_group_attributes(
        &self,
        group: &ExternalGroup,
        _record: &LocalPrincipalRecord,
    ) -> EngineResult<SyncStatus> {
        self.record_call(format!("group_attrs:{}", group.id));
        Ok(SyncStatus::Update)
    }

    async fn sync_legacy_membership(
        &self,
        external: &ExternalIdentity,
        _record: &LocalPrincipalRecord,
        depth: u32,
    ) -> EngineResult<()> {
        self.record_call(format!("legacy_membership:{}:{depth}", external.id()));
        Ok(())
    }
}

/// Wired-up engine with handles onto every collaborator.
pub struct Harness {
    pub provider: Arc<MockProvider>,
    pub store: Arc<MemoryStore>,
    pub delegate: Arc<RecordingDelegate>,
    pub engine: SyncEngine,
}

pub fn harness(policy: SyncPolicy, provider: MockProvider) -> Harness {
    init_tracing();
    let provider = Arc::new(provider);
    let store = Arc::new(MemoryStore::new());
    let delegate = Arc::new(RecordingDelegate::new(store.clone()));
    let engine = SyncEngine::new(
        policy,
        provider.clone(),
        store.clone(),
        delegate.clone(),
    );
    Harness {
        provider,
        store,
        delegate,
        engine,
    }
}
