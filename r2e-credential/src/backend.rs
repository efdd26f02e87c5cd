//! Collaborator traits for identity, relationship and metadata storage.
//!
//! The crate never persists anything itself. Implement these traits on top
//! of your database, or use [`MemoryBackend`](crate::memory::MemoryBackend)
//! in tests.

use crate::error::StoreError;
use crate::model::{Account, Credential, Group, MetadataEntry, User};
use crate::role::Roles;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by every collaborator call.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Read access to accounts, users, groups and credentials.
///
/// Lookups of a missing record must fail with [`StoreError::NotFound`].
pub trait IdentityDirectory: Send + Sync + 'static {
    /// Account owned by the user with the given name.
    fn get_account<'a>(&'a self, user: &'a str) -> StoreFuture<'a, Account>;

    /// User profile with the given name.
    fn get_user<'a>(&'a self, user: &'a str) -> StoreFuture<'a, User>;

    /// Group with the given slug.
    fn get_group<'a>(&'a self, slug: &'a str) -> StoreFuture<'a, Group>;

    /// Credential resource with the given identifier.
    fn get_credential<'a>(&'a self, identifier: &'a str) -> StoreFuture<'a, Credential>;

    /// Stored metadata for every identifier that exists.
    ///
    /// Identifiers without metadata are left out of the result. Fails with
    /// [`StoreError::NotFound`] when none exist.
    fn get_credential_metadata<'a>(
        &'a self,
        identifiers: &'a [String],
    ) -> StoreFuture<'a, Vec<MetadataEntry>>;
}

/// Selects relationships that point at `target_id`, originate from any of
/// `source_ids` and carry any of `roles`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipSelector {
    pub target_id: String,
    pub source_ids: Vec<String>,
    pub roles: Roles,
}

impl RelationshipSelector {
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            source_ids: Vec::new(),
            roles: Roles::new(),
        }
    }

    pub fn source(mut self, id: impl Into<String>) -> Self {
        self.source_ids.push(id.into());
        self
    }

    pub fn roles(mut self, roles: Roles) -> Self {
        self.roles = roles;
        self
    }

    /// Whether a relationship `source --role--> target` satisfies this selector.
    pub fn matches(&self, target: &str, source: &str, role: &str) -> bool {
        self.target_id == target
            && self.source_ids.iter().any(|s| s == source)
            && self.roles.contains(role)
    }
}

/// Counts typed relationships between records.
pub trait RelationshipStore: Send + Sync + 'static {
    /// Number of relationships matching every constraint of `selector`.
    fn count<'a>(&'a self, selector: &'a RelationshipSelector) -> StoreFuture<'a, u64>;
}

/// Write access to credential metadata.
pub trait MetadataPersistence: Send + Sync + 'static {
    /// Replace the metadata of an existing credential.
    ///
    /// Must fail with [`StoreError::NotFound`] instead of creating the record.
    fn update_metadata<'a>(
        &'a self,
        identifier: &'a str,
        meta: &'a serde_json::Value,
    ) -> StoreFuture<'a, ()>;

    /// Create metadata for a new credential.
    ///
    /// Belongs to whoever owns the credential lifecycle;
    /// [`MetadataStore`](crate::MetadataStore) never calls it.
    fn create_metadata(&self, entry: MetadataEntry) -> StoreFuture<'_, ()>;
}
