//! Authorization grants.
//!
//! A grant is anything implementing [`Perm`]. The authorizer produces
//! [`ResolvedPermission`]s, which carry the identity records they were
//! derived from and can be partially reused by later checks. Grants obtained
//! elsewhere (e.g. restored from a session) are wrapped as
//! [`Permission::Opaque`] and only ever reused as a whole.

use crate::model::{Account, Credential, Group, User};
use crate::role::Roles;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Capability exposed by every grant.
pub trait Perm: fmt::Debug + Send + Sync {
    /// Name of the user the grant was issued to.
    fn granted_user(&self) -> &str;
    /// Slug of the group the grant was issued for.
    fn granted_group(&self) -> &str;
    /// Roles the grant was issued with.
    fn granted_roles(&self) -> &Roles;
}

/// A grant computed by the [`Authorizer`](crate::Authorizer), together with
/// the records it was resolved from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPermission {
    pub account: Arc<Account>,
    pub user: Arc<User>,
    pub group: Arc<Group>,
    pub credential: Arc<Credential>,
    pub roles: Roles,
    /// Whether membership of `user` in `group` has been verified. A cached
    /// permission is trusted for its own user and group regardless of this
    /// flag.
    pub member: bool,
}

impl Perm for ResolvedPermission {
    fn granted_user(&self) -> &str {
        &self.user.name
    }

    fn granted_group(&self) -> &str {
        &self.group.slug
    }

    fn granted_roles(&self) -> &Roles {
        &self.roles
    }
}

/// A plain grant with no resolved records behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub user: String,
    pub group: String,
    pub roles: Roles,
}

impl Grant {
    pub fn new<I, S>(user: impl Into<String>, group: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user: user.into(),
            group: group.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

impl Perm for Grant {
    fn granted_user(&self) -> &str {
        &self.user
    }

    fn granted_group(&self) -> &str {
        &self.group
    }

    fn granted_roles(&self) -> &Roles {
        &self.roles
    }
}

/// A cached or freshly computed grant.
///
/// Cloning shares the underlying grant; use [`ptr_eq`](Self::ptr_eq) to tell
/// whether two values are the same cached object.
#[derive(Debug, Clone)]
pub enum Permission {
    /// Computed by the authorizer; its records can be reused.
    Resolved(Arc<ResolvedPermission>),
    /// Only the [`Perm`] accessors are available.
    Opaque(Arc<dyn Perm>),
}

impl Permission {
    /// Wrap any grant as an opaque permission.
    pub fn opaque(perm: impl Perm + 'static) -> Self {
        Permission::Opaque(Arc::new(perm))
    }

    pub fn as_resolved(&self) -> Option<&ResolvedPermission> {
        match self {
            Permission::Resolved(perm) => Some(perm),
            Permission::Opaque(_) => None,
        }
    }

    /// Whether both values share the same underlying grant.
    pub fn ptr_eq(&self, other: &Permission) -> bool {
        match (self, other) {
            (Permission::Resolved(a), Permission::Resolved(b)) => Arc::ptr_eq(a, b),
            (Permission::Opaque(a), Permission::Opaque(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }

    fn inner(&self) -> &dyn Perm {
        match self {
            Permission::Resolved(perm) => perm.as_ref(),
            Permission::Opaque(perm) => perm.as_ref(),
        }
    }
}

impl Perm for Permission {
    fn granted_user(&self) -> &str {
        self.inner().granted_user()
    }

    fn granted_group(&self) -> &str {
        self.inner().granted_group()
    }

    fn granted_roles(&self) -> &Roles {
        self.inner().granted_roles()
    }
}

impl From<ResolvedPermission> for Permission {
    fn from(perm: ResolvedPermission) -> Self {
        Permission::Resolved(Arc::new(perm))
    }
}
