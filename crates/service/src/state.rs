use std::sync::Arc;

use http::HeaderName;

use common::access::{AccessResolver, ManifestCache, MissingBucketPolicy};
use common::gate::Gate;
use common::resolve::{PathResolver, RootError};

use super::config::{Config, ConfigError};

/// Shared request-time state: the gate and how callers are identified.
///
/// Nothing in here caches an authorization decision. The gate re-reads the
///  ACL for every request.
#[derive(Clone)]
pub struct State {
    gate: Arc<Gate>,
    principal_header: HeaderName,
    allow_anonymous: bool,
}

impl State {
    pub fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let paths = PathResolver::new(&config.storage_root)?;
        tracing::info!(root = %paths.root().display(), "storage root resolved");

        let policy = if config.strict_buckets {
            MissingBucketPolicy::Deny
        } else {
            MissingBucketPolicy::Empty
        };
        let mut access = AccessResolver::new(&config.acl_path).with_policy(policy);
        if config.cache_manifests {
            access = access.with_cache(ManifestCache::new());
        }

        // not fatal: the document is re-read per request and may be fixed live
        if let Err(e) = access.acl() {
            tracing::warn!(acl = %config.acl_path.display(), error = %e, "acl document unusable at startup");
        }

        Ok(Self {
            gate: Arc::new(Gate::new(access, paths)),
            principal_header: config.principal_header()?,
            allow_anonymous: config.allow_anonymous,
        })
    }

    pub fn gate(&self) -> &Arc<Gate> {
        &self.gate
    }

    pub fn principal_header(&self) -> &HeaderName {
        &self.principal_header
    }

    pub fn allow_anonymous(&self) -> bool {
        self.allow_anonymous
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("storage root error: {0}")]
    StorageRoot(#[from] RootError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
