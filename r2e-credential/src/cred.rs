//! Credential handles and their permission memo.

use crate::permission::Permission;

/// Caller-held handle to a credential resource.
///
/// Each handle memoizes one [`Permission`]. The slot starts empty and is
/// filled by the first successful [`Authorizer::validate`](crate::Authorizer::validate)
/// call; later successes never overwrite it. Use a fresh handle to start over.
///
/// `validate` takes `&mut Cred`, so a handle is checked by at most one call at
/// a time. Share handles across tasks behind your own lock.
#[derive(Debug, Clone)]
pub struct Cred {
    ident: String,
    perm: Option<Permission>,
}

impl Cred {
    /// A handle with an empty permission slot.
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            perm: None,
        }
    }

    /// A handle seeded with a grant obtained elsewhere.
    pub fn with_permission(ident: impl Into<String>, perm: Permission) -> Self {
        Self {
            ident: ident.into(),
            perm: Some(perm),
        }
    }

    /// Identifier of the credential resource.
    pub fn ident(&self) -> &str {
        &self.ident
    }

    /// The memoized permission, if any.
    pub fn permission(&self) -> Option<&Permission> {
        self.perm.as_ref()
    }

    /// Store `perm` unless the slot is already taken. Returns whether it was stored.
    pub(crate) fn fill(&mut self, perm: &Permission) -> bool {
        if self.perm.is_some() {
            return false;
        }
        self.perm = Some(perm.clone());
        true
    }
}
