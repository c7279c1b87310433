//! Manifest builder
//!
//! Indexes a storage root (or a whitelist of its top-level subtrees) into a
//!  [`Manifest`] and commits it atomically. The build is a single sequential
//!  pass over explicit steps, each testable on its own:
//!
//! ```text
//! resolve_scope -> scan -> lock_down -> describe -> assign identity -> emit
//! ```
//!
//! Every check that can fail the build (root, whitelist, target directory,
//!  prior manifest, platform support) runs before the first filesystem
//!  mutation, so a failed build never leaves the tree half locked down or a
//!  partial manifest behind.

mod describe;
mod identity;
mod lockdown;
mod scan;
mod scope;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::manifest::{Entry, Manifest, ManifestError};

pub use describe::{describe, hash_file, Described, FileContent};
pub use identity::IdentityTable;
pub use lockdown::{ensure_supported, lock_down, LOCKED_DIR_MODE, LOCKED_FILE_MODE};
pub use scan::{scan, Candidate};
pub use scope::{resolve_scope, ScanRoot, Scope};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("required capability unavailable: {0}")]
    Unsupported(&'static str),
    #[error("storage root {path} is not accessible: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage root {0} is not a directory")]
    RootNotDirectory(PathBuf),
    #[error("invalid whitelist entry {0:?}: must be a single top-level directory name")]
    InvalidScope(String),
    #[error("no scan roots remain after resolving the whitelist")]
    NoScanRoots,
    #[error("manifest target directory {0} does not exist")]
    TargetDirectory(PathBuf),
    #[error("prior manifest unusable: {0}")]
    Prior(#[source] ManifestError),
    #[error("failed to walk storage tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("entry changed type during the build: {0}")]
    Changed(PathBuf),
    #[error("failed to emit manifest: {0}")]
    Emit(#[source] ManifestError),
}

/// Knobs that change how a build touches the tree, not what it indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Force directories to `0o555` and files to `0o444` before indexing.
    pub lock_permissions: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            lock_permissions: true,
        }
    }
}

/// Builds one bucket manifest.
///
/// ```ignore
/// let manifest = ManifestBuilder::new("/srv/data")
///     .whitelist(["public"])
///     .prior("/srv/manifests/public.json")
///     .build(Path::new("/srv/manifests/public.json"))?;
/// ```
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    root: PathBuf,
    whitelist: Option<Vec<String>>,
    prior: Option<PathBuf>,
    options: BuildOptions,
}

impl ManifestBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            whitelist: None,
            prior: None,
            options: BuildOptions::default(),
        }
    }

    /// Restrict the scan to these top-level subtrees of the root.
    pub fn whitelist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Manifest to carry identifiers forward from.
    pub fn prior(mut self, path: impl Into<PathBuf>) -> Self {
        self.prior = Some(path.into());
        self
    }

    pub fn options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the build and commit the result to `target`.
    pub fn build(&self, target: &Path) -> Result<Manifest, BuildError> {
        // preflight: nothing below this block mutates the filesystem until lock_down
        if self.options.lock_permissions {
            ensure_supported()?;
        }
        let scope = resolve_scope(&self.root, self.whitelist.as_deref())?;
        let target_abs = absolutize(target)?;
        let mut identity = self.load_identity(&scope)?;

        let mut excluded = HashSet::new();
        exclude_manifest_location(&scope, target_abs, &mut excluded);
        if let Some(prior) = &self.prior {
            if let Ok(prior_abs) = absolutize(prior) {
                exclude_manifest_location(&scope, prior_abs, &mut excluded);
            }
        }

        let candidates = scan(&scope, &excluded)?;
        if self.options.lock_permissions {
            lock_down(&candidates)?;
        }

        let described = candidates
            .into_iter()
            .map(describe)
            .collect::<Result<Vec<_>, _>>()?;
        let entries = assign_identities(described, &mut identity);
        let carried = entries.iter().filter(|e| identity.carries(e)).count();

        let manifest = Manifest::new(scope.base.clone(), entries);
        manifest.store(target).map_err(BuildError::Emit)?;

        let stats = manifest.stats();
        tracing::info!(
            target = %target.display(),
            base = %scope.base,
            entries = stats.total_entries,
            files = stats.total_files,
            dirs = stats.total_dirs,
            bytes = stats.total_bytes,
            carried,
            "manifest built"
        );
        Ok(manifest)
    }

    fn load_identity(&self, scope: &Scope) -> Result<IdentityTable, BuildError> {
        let Some(prior) = &self.prior else {
            return Ok(IdentityTable::empty());
        };
        match Manifest::load(prior) {
            Ok(manifest) if manifest.base() == scope.base => {
                let table = IdentityTable::from_manifest(&manifest);
                tracing::debug!(prior = %prior.display(), known = table.len(), "loaded carry-forward table");
                Ok(table)
            }
            Ok(manifest) => {
                tracing::warn!(
                    prior = %prior.display(),
                    prior_base = %manifest.base(),
                    base = %scope.base,
                    "prior manifest indexes a different base, identifiers will not carry forward"
                );
                Ok(IdentityTable::empty())
            }
            Err(e) if e.is_missing() => {
                tracing::warn!(prior = %prior.display(), "prior manifest not found, minting fresh identifiers");
                Ok(IdentityTable::empty())
            }
            Err(e) => Err(BuildError::Prior(e)),
        }
    }
}

/// Attach identifiers to described entries, in path order.
pub fn assign_identities(described: Vec<Described>, identity: &mut IdentityTable) -> Vec<Entry> {
    described
        .into_iter()
        .map(|d| {
            let uuid = identity.assign(&d.rel, d.hash());
            d.into_entry(uuid)
        })
        .collect()
}

/// Absolute form of a path that may not exist yet: the parent is canonicalized
///  and the file name re-attached.
/// Keep a manifest, and the directory it is committed into, out of the scan.
///
/// The commit writes a temporary file next to the target, so that directory
///  must never be locked down. The storage root itself is never locked, so a
///  manifest placed directly in it only excludes the file.
fn exclude_manifest_location(scope: &Scope, manifest: PathBuf, excluded: &mut HashSet<PathBuf>) {
    if let Some(dir) = manifest.parent() {
        if dir != scope.root && dir.starts_with(&scope.root) {
            excluded.insert(dir.to_path_buf());
        }
    }
    excluded.insert(manifest);
}

fn absolutize(path: &Path) -> Result<PathBuf, BuildError> {
    if let Ok(canonical) = fs::canonicalize(path) {
        return Ok(canonical);
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let parent_abs = fs::canonicalize(parent)
        .ok()
        .filter(|p| p.is_dir())
        .ok_or_else(|| BuildError::TargetDirectory(parent.to_path_buf()))?;
    match path.file_name() {
        Some(name) => Ok(parent_abs.join(name)),
        None => Err(BuildError::TargetDirectory(path.to_path_buf())),
    }
}
