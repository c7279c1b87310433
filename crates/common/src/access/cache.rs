use std::collections::HashMap;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::manifest::{Manifest, ManifestError};

/// What a manifest file looked like when it was parsed.
///
/// A committed rebuild always renames a fresh inode into place, so on unix the
///  device/inode pair changes even when length and mtime happen to collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    len: u64,
    modified: Option<SystemTime>,
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
}

impl Fingerprint {
    fn of(meta: &Metadata) -> Self {
        #[cfg(unix)]
        use std::os::unix::fs::MetadataExt;

        Self {
            len: meta.len(),
            modified: meta.modified().ok(),
            #[cfg(unix)]
            dev: meta.dev(),
            #[cfg(unix)]
            ino: meta.ino(),
        }
    }
}

/// Read-through cache of parsed manifests.
///
/// Every lookup re-stats the file and reparses on any fingerprint change, so a
///  rebuilt manifest is picked up by the next decision. Only parsed documents
///  live here, never ACLs or authorization outcomes.
#[derive(Debug, Default)]
pub struct ManifestCache {
    slots: Mutex<HashMap<PathBuf, (Fingerprint, Arc<Manifest>)>>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, path: &Path) -> Result<Arc<Manifest>, ManifestError> {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(source) => {
                self.slots.lock().remove(path);
                return Err(if source.kind() == std::io::ErrorKind::NotFound {
                    ManifestError::Missing(path.to_path_buf())
                } else {
                    ManifestError::Read {
                        path: path.to_path_buf(),
                        source,
                    }
                });
            }
        };
        let fingerprint = Fingerprint::of(&meta);

        if let Some((cached, manifest)) = self.slots.lock().get(path) {
            if *cached == fingerprint {
                return Ok(manifest.clone());
            }
        }

        // parse outside the lock; a concurrent reload of the same path is harmless
        let manifest = match Manifest::load(path) {
            Ok(manifest) => Arc::new(manifest),
            Err(e) => {
                self.slots.lock().remove(path);
                return Err(e);
            }
        };
        tracing::debug!(path = %path.display(), entries = manifest.entries().len(), "manifest (re)loaded");
        self.slots
            .lock()
            .insert(path.to_path_buf(), (fingerprint, manifest.clone()));
        Ok(manifest)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::manifest::Entry;

    fn manifest_with(paths: &[&str]) -> Manifest {
        let entries = paths
            .iter()
            .map(|p| Entry::file(Uuid::new_v4(), *p, 1, "ab", Utc::now(), 0o444, mime::TEXT_PLAIN))
            .collect();
        Manifest::new("", entries)
    }

    #[test]
    fn test_hit_returns_same_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        manifest_with(&["a.txt"]).store(&path).unwrap();

        let cache = ManifestCache::new();
        let first = cache.load(&path).unwrap();
        let second = cache.load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_rebuild_is_observed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        manifest_with(&["a.txt"]).store(&path).unwrap();

        let cache = ManifestCache::new();
        let before = cache.load(&path).unwrap();

        // an atomic store renames a new inode into place
        manifest_with(&["a.txt", "b.txt"]).store(&path).unwrap();
        let after = cache.load(&path).unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.entries().len(), 2);
    }

    #[test]
    fn test_removed_manifest_is_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        manifest_with(&["a.txt"]).store(&path).unwrap();

        let cache = ManifestCache::new();
        cache.load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert!(matches!(cache.load(&path), Err(ManifestError::Missing(_))));
        assert!(cache.is_empty());
    }
}
