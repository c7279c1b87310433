//! Token to path resolution
//!
//! A [`PathResolver`] turns a capability [`Token`] into a verified absolute
//!  path, looking only inside one principal's [`View`]. Every failure is a
//!  [`ResolveError`]; callers facing a client must collapse all of them into a
//!  single not-found answer, and only [`ResolveError::kind`] (for diagnostics)
//!  tells them apart.

mod token;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mime::Mime;
use uuid::Uuid;

use crate::access::{View, VisibleEntry};

pub use token::Token;

/// Which side of the error taxonomy a denial falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    /// The request itself is invalid: bad token, directory, escape, gone.
    Validation,
    /// The token is not in the principal's view.
    AuthorizationGap,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("malformed token {0:?}")]
    Malformed(String),
    #[error("{0} is not in the caller's view")]
    NotVisible(Uuid),
    #[error("{0} names a directory")]
    Directory(Uuid),
    #[error("{0} resolves outside the storage root")]
    OutsideRoot(Uuid),
    #[error("{uuid} could not be resolved on disk: {source}")]
    Missing {
        uuid: Uuid,
        #[source]
        source: io::Error,
    },
    #[error("{0} does not resolve to a regular file")]
    NotAFile(Uuid),
}

impl ResolveError {
    pub fn kind(&self) -> DenialKind {
        match self {
            ResolveError::NotVisible(_) => DenialKind::AuthorizationGap,
            ResolveError::Malformed(_)
            | ResolveError::Directory(_)
            | ResolveError::OutsideRoot(_)
            | ResolveError::Missing { .. }
            | ResolveError::NotAFile(_) => DenialKind::Validation,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("storage root {path} is not usable: {source}")]
pub struct RootError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// A file that passed every check and may be streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub uuid: Uuid,
    /// Canonical absolute path, a strict descendant of the storage root.
    pub path: PathBuf,
    /// Last segment of the manifest entry's path. Never taken from `path`,
    ///  which may name a symlink target the client must not learn about.
    pub name: String,
    pub mime: Mime,
    pub size: u64,
}

impl Resolved {
    pub fn file_name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// The root is canonicalized once here; every resolved path is compared
    ///  against this canonical form.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, RootError> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root).map_err(|source| RootError {
            path: root.to_path_buf(),
            source,
        })?;
        if !canonical.is_dir() {
            return Err(RootError {
                path: root.to_path_buf(),
                source: io::Error::new(io::ErrorKind::Other, "not a directory"),
            });
        }
        Ok(Self { root: canonical })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, token: &Token, view: &View) -> Result<Resolved, ResolveError> {
        let entry = view
            .get(token.uuid())
            .ok_or(ResolveError::NotVisible(*token.uuid()))?;
        self.resolve_entry(entry)
    }

    /// Checks for an entry already known to be in the caller's view.
    pub fn resolve_entry(&self, visible: &VisibleEntry) -> Result<Resolved, ResolveError> {
        let entry = visible.entry();
        let uuid = *entry.uuid();
        if !entry.is_file() {
            return Err(ResolveError::Directory(uuid));
        }

        let joined = self.root.join(visible.storage_path());
        let canonical =
            fs::canonicalize(&joined).map_err(|source| ResolveError::Missing { uuid, source })?;
        if canonical == self.root || !canonical.starts_with(&self.root) {
            return Err(ResolveError::OutsideRoot(uuid));
        }

        let meta =
            fs::metadata(&canonical).map_err(|source| ResolveError::Missing { uuid, source })?;
        if !meta.is_file() {
            return Err(ResolveError::NotAFile(uuid));
        }

        Ok(Resolved {
            uuid,
            path: canonical,
            name: entry.path().rsplit('/').next().unwrap_or_default().to_string(),
            mime: entry
                .mime()
                .cloned()
                .unwrap_or(mime::APPLICATION_OCTET_STREAM),
            size: meta.len(),
        })
    }
}
