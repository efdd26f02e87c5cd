//! Role sets and the subset matcher used for cache validity and grants.

use std::collections::BTreeSet;

/// Role substituted when a request names no roles.
pub const DEFAULT_ROLE: &str = "user";

/// Relationship name that proves an account belongs to a group.
pub const MEMBER_ROLE: &str = "member";

/// An ordered set of role names.
///
/// Ordered so that relationship selectors and log output are deterministic.
pub type Roles = BTreeSet<String>;

/// Returns `true` when every role in `required` is present in `granted`.
///
/// An empty `required` set is satisfied by anything.
///
/// ```
/// use r2e_credential::role::{roles, satisfies};
///
/// assert!(satisfies(&roles(["user", "admin"]), &roles(["admin"])));
/// assert!(!satisfies(&roles(["user"]), &roles(["admin"])));
/// ```
pub fn satisfies(granted: &Roles, required: &Roles) -> bool {
    required.is_subset(granted)
}

/// Build a role set from anything yielding role names.
pub fn roles<I, S>(names: I) -> Roles
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}
