//! Authorization requests.

use crate::error::AuthzError;
use crate::role::Roles;
use garde::Validate;

/// A request to use a credential: who asks, on behalf of which group, and
/// which roles they need.
///
/// # Example
///
/// ```
/// use r2e_credential::Filter;
///
/// let filter = Filter::new("alice", "acme").with_roles(["admin"]);
/// assert!(filter.validate().is_ok());
/// assert!(Filter::new("", "acme").validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct Filter {
    /// Requesting user name.
    #[garde(length(min = 1))]
    pub user: String,
    /// Requesting group slug.
    #[garde(length(min = 1))]
    pub group: String,
    /// Roles the request needs. Empty means the configured default roles.
    #[garde(skip)]
    pub roles: Roles,
}

impl Filter {
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
            roles: Roles::new(),
        }
    }

    /// Set the required roles.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Check that both user and group are present.
    pub fn validate(&self) -> Result<(), AuthzError> {
        Validate::validate(self).map_err(|report| {
            let fields = report
                .iter()
                .map(|(path, error)| format!("{path}: {}", error.message()))
                .collect::<Vec<_>>();
            AuthzError::InvalidFilter(fields.join(", "))
        })
    }

    /// The required roles, or `defaults` when none were requested.
    pub fn required_roles(&self, defaults: &Roles) -> Roles {
        if self.roles.is_empty() {
            defaults.clone()
        } else {
            self.roles.clone()
        }
    }
}
