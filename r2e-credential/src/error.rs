//! Error types for credential authorization and metadata operations.

use std::fmt;

/// Errors reported by the identity directory, relationship store and
/// metadata persistence layer.
#[derive(Debug)]
pub enum StoreError {
    /// The requested record does not exist.
    NotFound(String),
    /// The backing store failed.
    Backend(Box<dyn std::error::Error + Send + Sync>),
    Other(String),
}

impl StoreError {
    /// Construct a `Backend` variant from any error type.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Backend(Box::new(err))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(msg) => write!(f, "Not found: {msg}"),
            StoreError::Backend(err) => write!(f, "Store error: {err}"),
            StoreError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Backend(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Kind of record an authorization step failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Account,
    User,
    Group,
    Credential,
    Relationship,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Account => "account",
            Resource::User => "user",
            Resource::Group => "group",
            Resource::Credential => "credential",
            Resource::Relationship => "relationship",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`Authorizer::validate`](crate::Authorizer::validate).
#[derive(Debug)]
pub enum AuthzError {
    /// The filter is missing required fields. No lookup was performed.
    InvalidFilter(String),
    /// An account, user, group or credential could not be resolved.
    Lookup {
        resource: Resource,
        source: StoreError,
    },
    /// The user is not a member of the requested group.
    NotMember {
        user: String,
        group: String,
        source: Option<StoreError>,
    },
    /// Neither the user nor the group holds a required role on the credential.
    AccessDenied {
        user: String,
        credential: String,
        source: Option<StoreError>,
    },
}

impl AuthzError {
    /// The record kind the failure is attributed to, if any.
    pub fn resource(&self) -> Option<Resource> {
        match self {
            AuthzError::InvalidFilter(_) => None,
            AuthzError::Lookup { resource, .. } => Some(*resource),
            AuthzError::NotMember { .. } | AuthzError::AccessDenied { .. } => {
                Some(Resource::Relationship)
            }
        }
    }

    /// Whether this error denies access, as opposed to a lookup or input failure.
    pub fn is_denied(&self) -> bool {
        matches!(
            self,
            AuthzError::NotMember { .. } | AuthzError::AccessDenied { .. }
        )
    }
}

impl fmt::Display for AuthzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthzError::InvalidFilter(msg) => write!(f, "Invalid filter: {msg}"),
            AuthzError::Lookup { resource, source } => {
                write!(f, "Failed to resolve {resource}: {source}")
            }
            AuthzError::NotMember { user, group, .. } => {
                write!(f, "user {user:?} does not belong to {group:?} group")
            }
            AuthzError::AccessDenied {
                user, credential, ..
            } => write!(f, "user {user:?} has no access to {credential:?} credential"),
        }
    }
}

impl std::error::Error for AuthzError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthzError::InvalidFilter(_) => None,
            AuthzError::Lookup { source, .. } => Some(source),
            AuthzError::NotMember { source, .. } | AuthzError::AccessDenied { source, .. } => {
                source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// Whether a [`NotFoundError`] covers a whole batch or individual items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    /// The directory failed or resolved nothing; every requested identifier is listed.
    Batch,
    /// Only the listed identifiers were missing or failed to decode or validate.
    Items,
}

/// One or more credential identifiers could not be resolved.
#[derive(Debug)]
pub struct NotFoundError {
    pub identifiers: Vec<String>,
    pub kind: NotFoundKind,
    pub source: Option<StoreError>,
}

impl NotFoundError {
    pub fn batch(identifiers: Vec<String>, source: Option<StoreError>) -> Self {
        Self {
            identifiers,
            kind: NotFoundKind::Batch,
            source,
        }
    }

    pub fn items(identifiers: Vec<String>) -> Self {
        Self {
            identifiers,
            kind: NotFoundKind::Items,
            source: None,
        }
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.identifiers.iter().any(|i| i == identifier)
    }
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "credentials not found: {}", self.identifiers.join(", "))?;
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl std::error::Error for NotFoundError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// A single failed identifier in a metadata update.
#[derive(Debug)]
pub enum MetadataError {
    /// The credential does not exist; it is never created as a side effect.
    NotFound(NotFoundError),
    /// The persistence layer failed for this identifier.
    Store {
        identifier: String,
        source: StoreError,
    },
}

impl MetadataError {
    /// Identifiers this error refers to.
    pub fn identifiers(&self) -> &[String] {
        match self {
            MetadataError::NotFound(err) => &err.identifiers,
            MetadataError::Store { identifier, .. } => std::slice::from_ref(identifier),
        }
    }
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::NotFound(err) => fmt::Display::fmt(err, f),
            MetadataError::Store { identifier, source } => {
                write!(f, "failed to update credential {identifier:?}: {source}")
            }
        }
    }
}

impl std::error::Error for MetadataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MetadataError::NotFound(err) => Some(err),
            MetadataError::Store { source, .. } => Some(source),
        }
    }
}

impl From<NotFoundError> for MetadataError {
    fn from(err: NotFoundError) -> Self {
        MetadataError::NotFound(err)
    }
}

/// Every per-identifier failure of a metadata update, in input order.
#[derive(Debug, Default)]
pub struct AggregateError {
    pub errors: Vec<MetadataError>,
}

impl AggregateError {
    pub fn push(&mut self, err: impl Into<MetadataError>) {
        self.errors.push(err.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// All failing identifiers, flattened.
    pub fn identifiers(&self) -> Vec<&str> {
        self.errors
            .iter()
            .flat_map(|e| e.identifiers())
            .map(String::as_str)
            .collect()
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), AggregateError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            1 => write!(f, "1 error occurred: {}", self.errors[0]),
            n => {
                write!(f, "{n} errors occurred:")?;
                for err in &self.errors {
                    write!(f, "\n\t* {err}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for AggregateError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_not_found_display_lists_identifiers_and_cause() {
        let err = NotFoundError::batch(
            vec!["a".into(), "b".into()],
            Some(StoreError::Other("connection reset".into())),
        );
        assert_eq!(err.to_string(), "credentials not found: a, b: connection reset");
        assert!(err.source().is_some());
        assert_eq!(err.kind, NotFoundKind::Batch);
    }

    #[test]
    fn test_not_found_items_has_no_cause() {
        let err = NotFoundError::items(vec!["b".into()]);
        assert_eq!(err.to_string(), "credentials not found: b");
        assert!(err.source().is_none());
        assert!(err.contains("b"));
        assert!(!err.contains("a"));
    }

    #[test]
    fn test_authz_error_resource() {
        let err = AuthzError::Lookup {
            resource: Resource::Group,
            source: StoreError::NotFound("group \"ops\"".into()),
        };
        assert_eq!(err.resource(), Some(Resource::Group));
        assert!(!err.is_denied());

        let err = AuthzError::AccessDenied {
            user: "alice".into(),
            credential: "cred-1".into(),
            source: None,
        };
        assert_eq!(err.resource(), Some(Resource::Relationship));
        assert!(err.is_denied());
        assert_eq!(
            err.to_string(),
            "user \"alice\" has no access to \"cred-1\" credential"
        );

        assert_eq!(AuthzError::InvalidFilter("user".into()).resource(), None);
    }

    #[test]
    fn test_aggregate_identifiers_in_order() {
        let mut agg = AggregateError::default();
        assert!(agg.is_empty());

        agg.push(NotFoundError::items(vec!["b".into()]));
        agg.push(MetadataError::Store {
            identifier: "c".into(),
            source: StoreError::Other("timeout".into()),
        });

        assert_eq!(agg.identifiers(), vec!["b", "c"]);
        let err = agg.into_result().unwrap_err();
        assert_eq!(err.len(), 2);
        assert!(err.to_string().starts_with("2 errors occurred:"));
    }

    #[test]
    fn test_empty_aggregate_is_ok() {
        assert!(AggregateError::default().into_result().is_ok());
    }
}
