//! Configuration for credential authorization.

use crate::role::{Roles, DEFAULT_ROLE, MEMBER_ROLE};
use serde::Deserialize;

fn default_roles() -> Vec<String> { vec![DEFAULT_ROLE.to_string()] }
fn default_member_role() -> String { MEMBER_ROLE.to_string() }

/// Errors from [`CredentialConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidConfig(pub String);

impl std::fmt::Display for InvalidConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid credential config: {}", self.0)
    }
}

impl std::error::Error for InvalidConfig {}

/// Settings for the [`Authorizer`](crate::Authorizer).
///
/// All fields have defaults, so an empty section is valid.
///
/// ```yaml
/// credential:
///   default_roles: ["user"]   # default: ["user"]
///   member_role: "member"     # default: "member"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialConfig {
    /// Roles required when a filter names none. Default: `["user"]`.
    #[serde(default = "default_roles")]
    pub default_roles: Vec<String>,
    /// Relationship that proves group membership. Default: `"member"`.
    #[serde(default = "default_member_role")]
    pub member_role: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialConfig {
    pub fn new() -> Self {
        Self {
            default_roles: default_roles(),
            member_role: default_member_role(),
        }
    }

    /// Replace the roles used when a filter names none.
    pub fn with_default_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the membership relationship name.
    pub fn with_member_role(mut self, role: impl Into<String>) -> Self {
        self.member_role = role.into();
        self
    }

    /// The default roles as a set.
    pub fn default_role_set(&self) -> Roles {
        self.default_roles.iter().cloned().collect()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.default_roles.is_empty() {
            return Err(InvalidConfig("default_roles cannot be empty".into()));
        }
        if self.default_roles.iter().any(|r| r.is_empty()) {
            return Err(InvalidConfig("default_roles cannot contain an empty role".into()));
        }
        if self.member_role.is_empty() {
            return Err(InvalidConfig("member_role cannot be empty".into()));
        }
        Ok(())
    }
}
