//! Credential authorization with a per-handle permission memo.
//!
//! [`Authorizer::validate`] decides whether a user, acting for a group, may
//! use a credential under a set of roles. The handle's memoized permission is
//! reused as far as the new request allows:
//!
//! | cached vs. requested              | reused                                  |
//! |-----------------------------------|-----------------------------------------|
//! | different user                    | nothing                                 |
//! | same user, different group        | account and user profile                |
//! | same user and group, fewer roles  | the cached permission itself (hit)      |
//! | same user and group, more roles   | account, user, group and membership     |
//!
//! Opaque cached grants carry no records, so they are either a hit or
//! ignored entirely.

use crate::backend::{IdentityDirectory, RelationshipSelector, RelationshipStore};
use crate::config::{CredentialConfig, InvalidConfig};
use crate::cred::Cred;
use crate::error::{AuthzError, Resource, StoreError};
use crate::filter::Filter;
use crate::model::{Account, Group, User};
use crate::permission::{Perm, Permission, ResolvedPermission};
use crate::role::{satisfies, Roles};
use std::sync::Arc;

/// Records carried over from a cached permission.
#[derive(Default)]
struct Reuse {
    account: Option<Arc<Account>>,
    user: Option<Arc<User>>,
    group: Option<Arc<Group>>,
    member: bool,
}

/// Evaluates credential access against an identity directory and a
/// relationship store.
///
/// Cheap to clone; clones share the collaborators.
///
/// # Example
///
/// ```ignore
/// use r2e_credential::memory::MemoryBackend;
/// use r2e_credential::{Authorizer, Cred, Filter};
///
/// let backend = MemoryBackend::new();
/// backend.add_user("acc-1", "user-1", "alice");
/// backend.add_group("grp-1", "acme");
/// backend.add_credential("crd-1", "aws-prod");
/// backend.relate("acc-1", "grp-1", "member");
/// backend.relate("crd-1", "acc-1", "user");
///
/// let authorizer = Authorizer::new(backend.clone(), backend);
/// let mut cred = Cred::new("aws-prod");
///
/// // First check resolves everything and memoizes the permission.
/// let perm = authorizer.validate(&Filter::new("alice", "acme"), &mut cred).await?;
/// assert!(cred.permission().unwrap().ptr_eq(&perm));
///
/// // Same user, group and roles: served from the handle.
/// authorizer.validate(&Filter::new("alice", "acme"), &mut cred).await?;
/// ```
#[derive(Clone)]
pub struct Authorizer {
    directory: Arc<dyn IdentityDirectory>,
    relationships: Arc<dyn RelationshipStore>,
    default_roles: Roles,
    member_role: String,
}

impl Authorizer {
    /// Create an authorizer with the default configuration.
    pub fn new(directory: impl IdentityDirectory, relationships: impl RelationshipStore) -> Self {
        let config = CredentialConfig::default();
        Self {
            directory: Arc::new(directory),
            relationships: Arc::new(relationships),
            default_roles: config.default_role_set(),
            member_role: config.member_role,
        }
    }

    /// Create an authorizer with the given configuration.
    pub fn with_config(
        directory: impl IdentityDirectory,
        relationships: impl RelationshipStore,
        config: CredentialConfig,
    ) -> Result<Self, InvalidConfig> {
        config.validate()?;
        Ok(Self {
            directory: Arc::new(directory),
            relationships: Arc::new(relationships),
            default_roles: config.default_role_set(),
            member_role: config.member_role,
        })
    }

    /// Roles required when a filter names none.
    pub fn default_roles(&self) -> &Roles {
        &self.default_roles
    }

    /// Check whether `filter` may use the credential behind `cred`.
    ///
    /// On success the permission is returned and, if the handle had none,
    /// memoized in it. On failure the handle is left untouched.
    pub async fn validate(
        &self,
        filter: &Filter,
        cred: &mut Cred,
    ) -> Result<Permission, AuthzError> {
        filter.validate()?;

        let required = filter.required_roles(&self.default_roles);
        let mut reuse = Reuse::default();

        match cred.permission() {
            None => {}
            Some(Permission::Resolved(cached)) => {
                if cached.granted_user() != filter.user {
                    tracing::debug!(
                        user = %filter.user,
                        cached_user = %cached.granted_user(),
                        credential = %cred.ident(),
                        "cached permission belongs to another user"
                    );
                } else {
                    reuse.account = Some(cached.account.clone());
                    reuse.user = Some(cached.user.clone());

                    if cached.granted_group() != filter.group {
                        tracing::debug!(
                            user = %filter.user,
                            group = %filter.group,
                            cached_group = %cached.granted_group(),
                            credential = %cred.ident(),
                            "cached permission is for another group"
                        );
                    } else {
                        reuse.group = Some(cached.group.clone());
                        reuse.member = true;

                        if satisfies(cached.granted_roles(), &required) {
                            tracing::trace!(
                                user = %filter.user,
                                group = %filter.group,
                                credential = %cred.ident(),
                                "cache hit"
                            );
                            return Ok(Permission::Resolved(cached.clone()));
                        }

                        tracing::debug!(
                            user = %filter.user,
                            group = %filter.group,
                            credential = %cred.ident(),
                            ?required,
                            "cached roles do not cover request"
                        );
                    }
                }
            }
            Some(Permission::Opaque(cached)) => {
                if cached.granted_user() == filter.user
                    && cached.granted_group() == filter.group
                    && satisfies(cached.granted_roles(), &required)
                {
                    tracing::trace!(
                        user = %filter.user,
                        group = %filter.group,
                        credential = %cred.ident(),
                        "cache hit"
                    );
                    return Ok(Permission::Opaque(cached.clone()));
                }

                tracing::debug!(
                    user = %filter.user,
                    group = %filter.group,
                    credential = %cred.ident(),
                    "opaque cached permission does not match"
                );
            }
        }

        let account = match reuse.account {
            Some(account) => account,
            None => Arc::new(
                self.directory
                    .get_account(&filter.user)
                    .await
                    .map_err(lookup_error(Resource::Account))?,
            ),
        };

        let user = match reuse.user {
            Some(user) => user,
            None => Arc::new(
                self.directory
                    .get_user(&filter.user)
                    .await
                    .map_err(lookup_error(Resource::User))?,
            ),
        };

        let group = match reuse.group {
            Some(group) => group,
            None => Arc::new(
                self.directory
                    .get_group(&filter.group)
                    .await
                    .map_err(lookup_error(Resource::Group))?,
            ),
        };

        let credential = Arc::new(
            self.directory
                .get_credential(cred.ident())
                .await
                .map_err(lookup_error(Resource::Credential))?,
        );

        if !reuse.member {
            let belongs = RelationshipSelector::new(&account.id)
                .source(&group.id)
                .roles(Roles::from([self.member_role.clone()]));

            if let Err(source) = self.related(&belongs).await {
                tracing::warn!(
                    user = %filter.user,
                    group = %filter.group,
                    error = ?source,
                    "user does not belong to group"
                );
                return Err(AuthzError::NotMember {
                    user: filter.user.clone(),
                    group: filter.group.clone(),
                    source,
                });
            }
        }

        let access = RelationshipSelector::new(&credential.id)
            .source(&account.id)
            .source(&group.id)
            .roles(required.clone());

        if let Err(source) = self.related(&access).await {
            tracing::warn!(
                user = %filter.user,
                group = %filter.group,
                credential = %cred.ident(),
                ?required,
                error = ?source,
                "user has no access to credential"
            );
            return Err(AuthzError::AccessDenied {
                user: filter.user.clone(),
                credential: cred.ident().to_string(),
                source,
            });
        }

        let perm = Permission::from(ResolvedPermission {
            account,
            user,
            group,
            credential,
            roles: required,
            member: true,
        });

        if cred.fill(&perm) {
            tracing::debug!(
                user = %filter.user,
                group = %filter.group,
                credential = %cred.ident(),
                "permission cached"
            );
        }

        Ok(perm)
    }

    /// `Ok` when at least one relationship matches. A zero count maps to
    /// `Err(None)`, a store failure to `Err(Some(_))`.
    async fn related(&self, selector: &RelationshipSelector) -> Result<(), Option<StoreError>> {
        match self.relationships.count(selector).await {
            Ok(0) => Err(None),
            Ok(count) => {
                tracing::trace!(target_id = %selector.target_id, count, "relationships found");
                Ok(())
            }
            Err(err) => Err(Some(err)),
        }
    }
}

fn lookup_error(resource: Resource) -> impl FnOnce(StoreError) -> AuthzError {
    move |source| AuthzError::Lookup { resource, source }
}
