//! Credential access control for R2E.
//!
//! This crate answers one question: may this user, acting for this group,
//! use this credential under these roles? It answers from an identity
//! directory and a relationship store, and memoizes the answer on the
//! credential handle so that repeated checks skip the lookups they can.
//!
//! It also reads and updates the opaque metadata a credential carries, in
//! batches, reporting failures per identifier.
//!
//! # Overview
//!
//! - A **[`Filter`]** is the request: user, group, required roles.
//! - A **[`Cred`]** is the caller's handle to a credential. It memoizes one
//!   [`Permission`], filled by the first successful check.
//! - The **[`Authorizer`]** resolves the account, user profile, group and
//!   credential, then checks two relationships:
//!   1. the account is a `member` of the group;
//!   2. the account or the group holds one of the required roles on the
//!      credential.
//!
//! # Setup
//!
//! ```ignore
//! use r2e_credential::{Authorizer, CredentialConfig, Cred, Filter};
//!
//! let config = CredentialConfig::new().with_default_roles(["user"]);
//! let authorizer = Authorizer::with_config(directory, relationships, config)?;
//!
//! let mut cred = Cred::new("aws-prod");
//! let perm = authorizer
//!     .validate(&Filter::new("alice", "acme").with_roles(["admin"]), &mut cred)
//!     .await?;
//! ```
//!
//! # Cache reuse
//!
//! A later check on the same handle reuses what the memoized permission
//! still vouches for. A different user starts from scratch; a different group
//! keeps the account and profile but re-checks membership; a larger role set
//! keeps every record and membership but re-checks access. The memo itself
//! is never replaced: the first successful check pins it for the lifetime
//! of the handle.
//!
//! # Metadata
//!
//! ```ignore
//! use r2e_credential::metadata::{MetadataStore, Target};
//! use std::collections::BTreeMap;
//!
//! let store = MetadataStore::new(directory, persistence);
//!
//! let mut aws = AwsMeta::default();
//! let mut targets = BTreeMap::new();
//! targets.insert("aws-prod".to_string(), Target::decode(&mut aws));
//! targets.insert("gcp-dev".to_string(), Target::raw());
//!
//! if let Err(err) = store.fetch(&mut targets).await {
//!     // Targets not listed in `err.identifiers` were filled.
//! }
//! ```
//!
//! # Testing
//!
//! [`MemoryBackend`](memory::MemoryBackend) implements every collaborator in
//! memory and counts calls:
//!
//! ```ignore
//! use r2e_credential::memory::{Call, MemoryBackend};
//!
//! let backend = MemoryBackend::new();
//! backend.add_user("acc-1", "user-1", "alice");
//! backend.add_group("grp-1", "acme");
//! backend.add_credential("crd-1", "aws-prod");
//! backend.relate("acc-1", "grp-1", "member");
//! backend.relate("crd-1", "acc-1", "user");
//!
//! let authorizer = Authorizer::new(backend.clone(), backend.clone());
//! authorizer.validate(&Filter::new("alice", "acme"), &mut cred).await?;
//! assert_eq!(backend.calls(Call::User), 1);
//! ```

pub mod authorizer;
pub mod backend;
pub mod config;
pub mod cred;
pub mod error;
pub mod filter;
pub mod memory;
pub mod metadata;
pub mod model;
pub mod permission;
pub mod role;

// Re-exports
pub use authorizer::Authorizer;
pub use backend::{IdentityDirectory, MetadataPersistence, RelationshipSelector, RelationshipStore};
pub use config::CredentialConfig;
pub use cred::Cred;
pub use error::{AggregateError, AuthzError, MetadataError, NotFoundError, Resource, StoreError};
pub use filter::Filter;
pub use metadata::{CredentialMeta, MetadataStore, Target};
pub use permission::{Grant, Perm, Permission, ResolvedPermission};
pub use role::Roles;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::authorizer::Authorizer;
    pub use crate::cred::Cred;
    pub use crate::error::{AuthzError, NotFoundError};
    pub use crate::filter::Filter;
    pub use crate::metadata::{MetadataStore, Target};
    pub use crate::permission::{Perm, Permission};
}
