//! Access control
//!
//! Turns a trusted [`Principal`] into the [`View`] of entries it may resolve:
//!
//! ```text
//! AclDocument (fresh) -> granted buckets -> manifests -> merged View
//! ```
//!
//! The ACL document is re-read for every decision. Manifests may be served
//!  from a [`ManifestCache`], which revalidates against the file on each use.
//!  Any unusable ACL or manifest fails the decision closed.

mod acl;
mod cache;
mod principal;
mod view;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::manifest::{Manifest, ManifestError};

pub use acl::{AclDocument, AclError};
pub use cache::ManifestCache;
pub use principal::Principal;
pub use view::{View, VisibleEntry};

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error(transparent)]
    Acl(#[from] AclError),
    #[error("bucket {bucket:?}: {source}")]
    Manifest {
        bucket: String,
        #[source]
        source: ManifestError,
    },
    #[error("bucket {0:?} is granted but has no manifest")]
    MissingBucket(String),
}

/// What to do when a granted bucket has no manifest to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingBucketPolicy {
    /// Treat the bucket as empty and log a warning.
    #[default]
    Empty,
    /// Fail the whole decision.
    Deny,
}

/// Resolves principals to views against one ACL document.
#[derive(Debug)]
pub struct AccessResolver {
    acl_path: PathBuf,
    policy: MissingBucketPolicy,
    cache: Option<ManifestCache>,
}

impl AccessResolver {
    pub fn new(acl_path: impl Into<PathBuf>) -> Self {
        Self {
            acl_path: acl_path.into(),
            policy: MissingBucketPolicy::default(),
            cache: None,
        }
    }

    pub fn with_policy(mut self, policy: MissingBucketPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cache(mut self, cache: ManifestCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn acl_path(&self) -> &Path {
        &self.acl_path
    }

    pub fn policy(&self) -> MissingBucketPolicy {
        self.policy
    }

    /// Load the ACL document as it is on disk right now.
    pub fn acl(&self) -> Result<AclDocument, AclError> {
        AclDocument::load(&self.acl_path)
    }

    /// The merged view for `principal`; `None` is the anonymous caller and
    ///  receives the default grant.
    pub fn resolve_view(&self, principal: Option<&Principal>) -> Result<View, AccessError> {
        let acl = self.acl()?;
        let buckets = acl.buckets_for(principal);

        let mut manifests: Vec<Arc<Manifest>> = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            let Some(location) = acl.manifest_location(bucket) else {
                self.missing_bucket(bucket, None)?;
                continue;
            };
            match self.load_manifest(&location) {
                Ok(manifest) => manifests.push(manifest),
                Err(e) if e.is_missing() => self.missing_bucket(bucket, Some(&location))?,
                Err(source) => {
                    return Err(AccessError::Manifest {
                        bucket: bucket.to_string(),
                        source,
                    })
                }
            }
        }

        let view = View::from_manifests(manifests.iter().map(Arc::as_ref));
        tracing::debug!(
            principal = principal.map(Principal::as_str).unwrap_or("<anonymous>"),
            buckets = manifests.len(),
            entries = view.len(),
            "resolved view"
        );
        Ok(view)
    }

    fn load_manifest(&self, location: &Path) -> Result<Arc<Manifest>, ManifestError> {
        match &self.cache {
            Some(cache) => cache.load(location),
            None => Manifest::load(location).map(Arc::new),
        }
    }

    fn missing_bucket(&self, bucket: &str, location: Option<&Path>) -> Result<(), AccessError> {
        match self.policy {
            MissingBucketPolicy::Empty => {
                match location {
                    Some(location) => tracing::warn!(
                        %bucket,
                        location = %location.display(),
                        "granted bucket manifest not found, treating as empty"
                    ),
                    None => tracing::warn!(%bucket, "granted bucket is not declared, treating as empty"),
                }
                Ok(())
            }
            MissingBucketPolicy::Deny => Err(AccessError::MissingBucket(bucket.to_string())),
        }
    }
}
