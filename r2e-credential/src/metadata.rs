//! Batch access to credential metadata.
//!
//! [`MetadataStore::fetch`] reads the metadata of many credentials in one
//! directory call and decodes each entry into a caller-supplied [`Target`].
//! [`MetadataStore::put`] updates existing entries one by one and reports
//! every failure.
//!
//! Both operations work on caller-owned maps. `fetch` fills targets in place
//! even when it returns an error: every identifier *not* listed in the
//! returned [`NotFoundError`] has been filled and can be trusted.

use crate::backend::{IdentityDirectory, MetadataPersistence};
use crate::error::{AggregateError, MetadataError, NotFoundError};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Typed credential metadata.
///
/// Override [`valid`](Self::valid) to reject entries that decode but are
/// unusable; `fetch` reports them as missing.
///
/// ```
/// use r2e_credential::metadata::CredentialMeta;
/// use serde::Deserialize;
/// #[derive(Default, Deserialize)]
/// struct AwsMeta {
///     access_key: String,
///     secret_key: String,
/// }
///
/// impl CredentialMeta for AwsMeta {
///     fn valid(&self) -> Result<(), String> {
///         if self.access_key.is_empty() || self.secret_key.is_empty() {
///             return Err("missing keys".into());
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait CredentialMeta: DeserializeOwned + Send {
    fn valid(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Object-safe decode destination used by [`Target::Decode`].
///
/// Implemented for every [`CredentialMeta`].
pub trait MetadataSink: Send {
    /// Replace `self` with the decoded value.
    fn decode(&mut self, meta: &serde_json::Value) -> Result<(), serde_json::Error>;

    /// Check the decoded value.
    fn check(&self) -> Result<(), String>;
}

impl<T: CredentialMeta> MetadataSink for T {
    fn decode(&mut self, meta: &serde_json::Value) -> Result<(), serde_json::Error> {
        *self = T::deserialize(meta)?;
        Ok(())
    }

    fn check(&self) -> Result<(), String> {
        self.valid()
    }
}

/// Where fetched metadata for one identifier goes.
pub enum Target<'a> {
    /// Keep the stored JSON value as is.
    Raw(Option<serde_json::Value>),
    /// Decode and validate into a typed value.
    Decode(&'a mut dyn MetadataSink),
}

impl<'a> Target<'a> {
    pub fn raw() -> Self {
        Target::Raw(None)
    }

    pub fn decode(sink: &'a mut dyn MetadataSink) -> Self {
        Target::Decode(sink)
    }

    /// The stored value, for a filled [`Target::Raw`].
    pub fn raw_value(&self) -> Option<&serde_json::Value> {
        match self {
            Target::Raw(value) => value.as_ref(),
            Target::Decode(_) => None,
        }
    }
}

impl std::fmt::Debug for Target<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Raw(value) => f.debug_tuple("Raw").field(value).finish(),
            Target::Decode(_) => f.write_str("Decode(..)"),
        }
    }
}

/// Reads and updates credential metadata.
///
/// Cheap to clone; clones share the collaborators.
#[derive(Clone)]
pub struct MetadataStore {
    directory: Arc<dyn IdentityDirectory>,
    persistence: Arc<dyn MetadataPersistence>,
}

impl MetadataStore {
    pub fn new(directory: impl IdentityDirectory, persistence: impl MetadataPersistence) -> Self {
        Self {
            directory: Arc::new(directory),
            persistence: Arc::new(persistence),
        }
    }

    /// Fetch metadata for every identifier in `targets`.
    ///
    /// A directory failure fails the whole batch: the error lists every
    /// identifier and nothing is filled. Otherwise each entry is decoded on
    /// its own; identifiers that are absent, fail to decode or fail
    /// [`CredentialMeta::valid`] are listed in the error while the others are
    /// still filled.
    pub async fn fetch(
        &self,
        targets: &mut BTreeMap<String, Target<'_>>,
    ) -> Result<(), NotFoundError> {
        if targets.is_empty() {
            return Ok(());
        }

        let identifiers: Vec<String> = targets.keys().cloned().collect();

        let entries = match self.directory.get_credential_metadata(&identifiers).await {
            Ok(entries) => entries,
            Err(err) if err.is_not_found() => {
                return Err(NotFoundError::batch(identifiers, None));
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    count = identifiers.len(),
                    "credential metadata lookup failed"
                );
                return Err(NotFoundError::batch(identifiers, Some(err)));
            }
        };

        let mut found: HashMap<String, serde_json::Value> = entries
            .into_iter()
            .map(|entry| (entry.identifier, entry.meta))
            .collect();

        let mut missing = Vec::new();

        for (ident, target) in targets.iter_mut() {
            let Some(meta) = found.remove(ident) else {
                missing.push(ident.clone());
                continue;
            };

            match target {
                Target::Raw(slot) => *slot = Some(meta),
                Target::Decode(sink) => {
                    if let Err(err) = sink.decode(&meta) {
                        tracing::warn!(
                            identifier = %ident,
                            error = %err,
                            "failed to decode credential metadata"
                        );
                        missing.push(ident.clone());
                        continue;
                    }
                    if let Err(reason) = sink.check() {
                        tracing::warn!(identifier = %ident, %reason, "invalid credential metadata");
                        missing.push(ident.clone());
                        continue;
                    }
                }
            }

            tracing::debug!(identifier = %ident, "fetched credential metadata");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(NotFoundError::items(missing))
        }
    }

    /// Update the metadata of existing credentials.
    ///
    /// Every entry is attempted. Credentials are never created: a missing
    /// one is reported as [`MetadataError::NotFound`] for its identifier.
    pub async fn put(
        &self,
        entries: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), AggregateError> {
        let mut errors = AggregateError::default();

        for (ident, meta) in entries {
            match self.persistence.update_metadata(ident, meta).await {
                Ok(()) => tracing::debug!(identifier = %ident, "updated credential metadata"),
                Err(err) if err.is_not_found() => {
                    errors.push(NotFoundError::items(vec![ident.clone()]));
                }
                Err(source) => {
                    tracing::warn!(
                        identifier = %ident,
                        error = %source,
                        "failed to update credential metadata"
                    );
                    errors.push(MetadataError::Store {
                        identifier: ident.clone(),
                        source,
                    });
                }
            }
        }

        errors.into_result()
    }
}
