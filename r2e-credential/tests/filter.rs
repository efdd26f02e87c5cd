use r2e_credential::role::roles;
use r2e_credential::{AuthzError, Filter, Roles};

#[test]
fn test_new_filter_has_no_roles() {
    let filter = Filter::new("alice", "acme");
    assert_eq!(filter.user, "alice");
    assert_eq!(filter.group, "acme");
    assert!(filter.roles.is_empty());
    assert!(filter.validate().is_ok());
}

#[test]
fn test_missing_user_is_rejected() {
    let err = Filter::new("", "acme").validate().unwrap_err();
    match err {
        AuthzError::InvalidFilter(msg) => {
            assert!(msg.contains("user"), "{msg}");
            assert!(!msg.contains("group"), "{msg}");
        }
        other => panic!("expected InvalidFilter, got {other:?}"),
    }
}

#[test]
fn test_missing_group_is_rejected() {
    let err = Filter::new("alice", "").validate().unwrap_err();
    assert!(matches!(err, AuthzError::InvalidFilter(ref msg) if msg.contains("group")));
    assert!(err.resource().is_none());
}

#[test]
fn test_both_missing_are_reported() {
    let err = Filter::new("", "").validate().unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("user"), "{msg}");
    assert!(msg.contains("group"), "{msg}");
}

#[test]
fn test_with_roles_deduplicates() {
    let filter = Filter::new("alice", "acme").with_roles(["admin", "user", "admin"]);
    assert_eq!(filter.roles, roles(["user", "admin"]));
}

#[test]
fn test_required_roles_fall_back_to_defaults() {
    let defaults: Roles = roles(["user"]);

    let filter = Filter::new("alice", "acme");
    assert_eq!(filter.required_roles(&defaults), defaults);

    let filter = filter.with_roles(["admin"]);
    assert_eq!(filter.required_roles(&defaults), roles(["admin"]));
}
