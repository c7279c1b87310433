use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entry::Entry;

/// Document format version written by this build. Anything else is rejected on load.
pub const MANIFEST_VERSION: u32 = 1;

/// Permission bits a committed manifest is left with.
pub const MANIFEST_FILE_MODE: u32 = 0o444;

/// Header statistics over a set of entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_entries: u64,
    pub total_files: u64,
    pub total_dirs: u64,
    pub total_bytes: u64,
}

impl Stats {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        entries.into_iter().fold(Stats::default(), |mut stats, entry| {
            stats.total_entries += 1;
            if entry.is_dir() {
                stats.total_dirs += 1;
            } else {
                stats.total_files += 1;
                stats.total_bytes += entry.size();
            }
            stats
        })
    }
}

/// The versioned, read-only catalog of one bucket.
///
/// Entries are always held in byte-wise lexicographic path order; [`Manifest::new`]
///  sorts, and [`Manifest::load`] rejects documents that are out of order or carry
///  duplicate paths or identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    version: u32,
    generated_at: DateTime<Utc>,
    /// Storage-root-relative directory entry paths are relative to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    base: String,
    stats: Stats,
    entries: Vec<Entry>,
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest not found: {0}")]
    Missing(PathBuf),
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed manifest {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("inconsistent manifest {path}: {reason}")]
    Inconsistent { path: PathBuf, reason: String },
    #[error("unsupported manifest version {found} (expected {MANIFEST_VERSION})")]
    UnsupportedVersion { found: u32 },
    #[error("failed to write manifest {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode manifest: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ManifestError {
    /// True when the manifest simply does not exist on disk.
    pub fn is_missing(&self) -> bool {
        matches!(self, ManifestError::Missing(_))
    }
}

impl Manifest {
    /// Assemble a manifest over `entries`, sorting them by path and computing stats.
    pub fn new(base: impl Into<String>, mut entries: Vec<Entry>) -> Self {
        entries.sort_by(|a, b| a.path().cmp(b.path()));
        let stats = Stats::from_entries(&entries);
        Self {
            version: MANIFEST_VERSION,
            generated_at: Utc::now(),
            base: base.into(),
            stats,
            entries,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn generated_at(&self) -> &DateTime<Utc> {
        &self.generated_at
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    /// Read and validate a manifest document.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let bytes = fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ManifestError::Missing(path.to_path_buf())
            } else {
                ManifestError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let manifest: Manifest =
            serde_json::from_slice(&bytes).map_err(|source| ManifestError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        if manifest.version != MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion {
                found: manifest.version,
            });
        }

        manifest
            .check_invariants()
            .map_err(|reason| ManifestError::Inconsistent {
                path: path.to_path_buf(),
                reason,
            })?;

        Ok(manifest)
    }

    /// Structural invariants: path order, unique paths and identifiers, and
    ///  hashes present exactly on files.
    fn check_invariants(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::with_capacity(self.entries.len());
        for pair in self.entries.windows(2) {
            if pair[0].path() >= pair[1].path() {
                return Err(format!(
                    "entries out of order or duplicated at {:?}",
                    pair[1].path()
                ));
            }
        }
        for entry in &self.entries {
            if !seen.insert(*entry.uuid()) {
                return Err(format!("duplicate identifier {}", entry.uuid()));
            }
            if entry.is_file() != entry.hash().is_some() {
                return Err(format!("hash/kind mismatch at {:?}", entry.path()));
            }
        }
        Ok(())
    }

    /// Write the manifest to `target` atomically.
    ///
    /// The document goes to a temporary file next to the target, is flushed,
    ///  synced and marked read-only, then renamed over the target. Readers see
    ///  either the previous document or this one, never a partial write.
    pub fn store(&self, target: &Path) -> Result<(), ManifestError> {
        let write_err = |source| ManifestError::Write {
            path: target.to_path_buf(),
            source,
        };

        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let temp = tempfile::Builder::new()
            .prefix(".capvault-manifest-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(write_err)?;

        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.write_all(b"\n").map_err(write_err)?;
            writer.flush().map_err(write_err)?;
        }
        temp.as_file().sync_all().map_err(write_err)?;
        mark_read_only(temp.as_file()).map_err(write_err)?;

        temp.persist(target).map_err(|e| write_err(e.error))?;

        tracing::debug!(
            path = %target.display(),
            entries = self.stats.total_entries,
            "manifest committed"
        );
        Ok(())
    }
}

#[cfg(unix)]
fn mark_read_only(file: &File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(MANIFEST_FILE_MODE))
}

#[cfg(not(unix))]
fn mark_read_only(file: &File) -> std::io::Result<()> {
    let mut perms = file.metadata()?.permissions();
    perms.set_readonly(true);
    file.set_permissions(perms)
}
