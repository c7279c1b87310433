use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::principal::Principal;

#[derive(Debug, thiserror::Error)]
pub enum AclError {
    #[error("acl document not found: {0}")]
    Missing(PathBuf),
    #[error("failed to read acl document {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed acl document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Administrator-owned mapping of principals to buckets.
///
/// ```json
/// { "manifests": { "public": "manifests/public.json" },
///   "users": { "user1": ["public"] },
///   "default": [] }
/// ```
///
/// Unknown keys are rejected so a misspelled `default` or `users` fails closed
///  instead of silently granting nothing (or everything).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AclDocument {
    manifests: BTreeMap<String, PathBuf>,
    #[serde(default)]
    users: HashMap<String, Vec<String>>,
    #[serde(default)]
    default: Vec<String>,
    /// Directory relative manifest locations resolve against.
    #[serde(skip)]
    dir: PathBuf,
}

impl AclDocument {
    /// Read and parse an ACL document. Called once per authorization decision.
    pub fn load(path: &Path) -> Result<Self, AclError> {
        let bytes = fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AclError::Missing(path.to_path_buf())
            } else {
                AclError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let mut acl: AclDocument =
            serde_json::from_slice(&bytes).map_err(|source| AclError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        acl.dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(acl)
    }

    /// Buckets visible to `principal`, in declared order with repeats removed.
    ///
    /// A principal with an explicit grant gets exactly that grant (even if it is
    ///  empty); anyone else, including an anonymous caller, gets the default grant.
    pub fn buckets_for(&self, principal: Option<&Principal>) -> Vec<&str> {
        let grant = principal
            .and_then(|p| self.users.get(p.as_str()))
            .unwrap_or(&self.default);

        let mut buckets: Vec<&str> = Vec::with_capacity(grant.len());
        for name in grant {
            if !buckets.contains(&name.as_str()) {
                buckets.push(name.as_str());
            }
        }
        buckets
    }

    /// Where the manifest for `bucket` lives, if the bucket is declared.
    pub fn manifest_location(&self, bucket: &str) -> Option<PathBuf> {
        self.manifests.get(bucket).map(|location| {
            if location.is_absolute() {
                location.clone()
            } else {
                self.dir.join(location)
            }
        })
    }
}
