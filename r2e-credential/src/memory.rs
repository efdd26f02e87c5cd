//! In-memory backend for tests.

use crate::backend::{
    IdentityDirectory, MetadataPersistence, RelationshipSelector, RelationshipStore, StoreFuture,
};
use crate::error::StoreError;
use crate::model::{Account, Credential, Group, MetadataEntry, User};
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Collaborator operations counted by [`MemoryBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    Account,
    User,
    Group,
    Credential,
    Metadata,
    Relationship,
    Update,
    Create,
}

const CALL_KINDS: usize = 8;

impl Call {
    const ALL: [Call; CALL_KINDS] = [
        Call::Account,
        Call::User,
        Call::Group,
        Call::Credential,
        Call::Metadata,
        Call::Relationship,
        Call::Update,
        Call::Create,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Default)]
struct Inner {
    accounts: DashMap<String, Account>,
    users: DashMap<String, User>,
    groups: DashMap<String, Group>,
    credentials: DashMap<String, Credential>,
    metadata: DashMap<String, serde_json::Value>,
    /// `(target_id, source_id, role)`
    relationships: DashSet<(String, String, String)>,
    failures: DashMap<Call, String>,
    calls: [AtomicUsize; CALL_KINDS],
}

/// In-memory identity directory, relationship store and metadata layer.
///
/// Records are keyed the way they are looked up: accounts and users by user
/// name, groups by slug, credentials and metadata by identifier. Every
/// collaborator call is counted per [`Call`] kind, and any kind can be made
/// to fail with [`fail`](Self::fail).
///
/// Clones share state, so keep one clone to seed data and inspect counters
/// while another is handed to the code under test.
///
/// # Example
///
/// ```
/// use r2e_credential::memory::{Call, MemoryBackend};
///
/// let backend = MemoryBackend::new();
/// backend.add_user("acc-1", "user-1", "alice");
/// assert_eq!(backend.calls(Call::User), 0);
/// ```
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account and user profile for `name`.
    pub fn add_user(&self, account_id: &str, user_id: &str, name: &str) {
        self.inner
            .accounts
            .insert(name.to_string(), Account::new(account_id, name));
        self.inner
            .users
            .insert(name.to_string(), User::new(user_id, name));
    }

    pub fn add_group(&self, id: &str, slug: &str) {
        self.inner
            .groups
            .insert(slug.to_string(), Group::new(id, slug));
    }

    pub fn add_credential(&self, id: &str, identifier: &str) {
        self.inner
            .credentials
            .insert(identifier.to_string(), Credential::new(id, identifier));
    }

    /// Seed metadata without counting a create call.
    pub fn add_metadata(&self, identifier: &str, meta: serde_json::Value) {
        self.inner.metadata.insert(identifier.to_string(), meta);
    }

    pub fn metadata(&self, identifier: &str) -> Option<serde_json::Value> {
        self.inner.metadata.get(identifier).map(|m| m.value().clone())
    }

    /// Add a relationship `source --role--> target`.
    pub fn relate(&self, target_id: &str, source_id: &str, role: &str) {
        self.inner.relationships.insert((
            target_id.to_string(),
            source_id.to_string(),
            role.to_string(),
        ));
    }

    pub fn unrelate(&self, target_id: &str, source_id: &str, role: &str) {
        self.inner.relationships.remove(&(
            target_id.to_string(),
            source_id.to_string(),
            role.to_string(),
        ));
    }

    /// Make every subsequent call of `kind` fail with `message`.
    pub fn fail(&self, kind: Call, message: &str) {
        self.inner.failures.insert(kind, message.to_string());
    }

    /// Stop failing calls of `kind`.
    pub fn recover(&self, kind: Call) {
        self.inner.failures.remove(&kind);
    }

    /// Number of calls of `kind` so far.
    pub fn calls(&self, kind: Call) -> usize {
        self.inner.calls[kind.index()].load(Ordering::Relaxed)
    }

    /// Number of calls of any kind so far.
    pub fn total_calls(&self) -> usize {
        Call::ALL.iter().map(|k| self.calls(*k)).sum()
    }

    pub fn reset_calls(&self) {
        for counter in &self.inner.calls {
            counter.store(0, Ordering::Relaxed);
        }
    }

    fn record(&self, kind: Call) -> Result<(), StoreError> {
        self.inner.calls[kind.index()].fetch_add(1, Ordering::Relaxed);
        match self.inner.failures.get(&kind) {
            Some(message) => Err(StoreError::Other(message.value().clone())),
            None => Ok(()),
        }
    }

    fn lookup<T: Clone>(
        &self,
        kind: Call,
        map: &DashMap<String, T>,
        key: &str,
    ) -> Result<T, StoreError> {
        self.record(kind)?;
        map.get(key)
            .map(|v| v.value().clone())
            .ok_or_else(|| StoreError::NotFound(format!("{kind:?} {key:?}")))
    }
}

impl IdentityDirectory for MemoryBackend {
    fn get_account<'a>(&'a self, user: &'a str) -> StoreFuture<'a, Account> {
        let result = self.lookup(Call::Account, &self.inner.accounts, user);
        Box::pin(async move { result })
    }

    fn get_user<'a>(&'a self, user: &'a str) -> StoreFuture<'a, User> {
        let result = self.lookup(Call::User, &self.inner.users, user);
        Box::pin(async move { result })
    }

    fn get_group<'a>(&'a self, slug: &'a str) -> StoreFuture<'a, Group> {
        let result = self.lookup(Call::Group, &self.inner.groups, slug);
        Box::pin(async move { result })
    }

    fn get_credential<'a>(&'a self, identifier: &'a str) -> StoreFuture<'a, Credential> {
        let result = self.lookup(Call::Credential, &self.inner.credentials, identifier);
        Box::pin(async move { result })
    }

    fn get_credential_metadata<'a>(
        &'a self,
        identifiers: &'a [String],
    ) -> StoreFuture<'a, Vec<MetadataEntry>> {
        let result = self.record(Call::Metadata).and_then(|()| {
            let entries: Vec<MetadataEntry> = identifiers
                .iter()
                .filter_map(|ident| {
                    self.inner.metadata.get(ident).map(|meta| MetadataEntry {
                        identifier: ident.clone(),
                        meta: meta.value().clone(),
                    })
                })
                .collect();
            if entries.is_empty() {
                Err(StoreError::NotFound("credential metadata".into()))
            } else {
                Ok(entries)
            }
        });
        Box::pin(async move { result })
    }
}

impl RelationshipStore for MemoryBackend {
    fn count<'a>(&'a self, selector: &'a RelationshipSelector) -> StoreFuture<'a, u64> {
        let result = self.record(Call::Relationship).map(|()| {
            self.inner
                .relationships
                .iter()
                .filter(|r| selector.matches(&r.0, &r.1, &r.2))
                .count() as u64
        });
        Box::pin(async move { result })
    }
}

impl MetadataPersistence for MemoryBackend {
    fn update_metadata<'a>(
        &'a self,
        identifier: &'a str,
        meta: &'a serde_json::Value,
    ) -> StoreFuture<'a, ()> {
        let result = self.record(Call::Update).and_then(|()| {
            match self.inner.metadata.get_mut(identifier) {
                Some(mut existing) => {
                    *existing = meta.clone();
                    Ok(())
                }
                None => Err(StoreError::NotFound(format!("credential {identifier:?}"))),
            }
        });
        Box::pin(async move { result })
    }

    fn create_metadata(&self, entry: MetadataEntry) -> StoreFuture<'_, ()> {
        let result = self.record(Call::Create).map(|()| {
            self.inner.metadata.insert(entry.identifier, entry.meta);
        });
        Box::pin(async move { result })
    }
}
