//! Shared fixtures for builder and resolution integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use common::builder::{BuildOptions, ManifestBuilder};
use common::manifest::{Entry, Manifest};
use tempfile::TempDir;

/// A scratch storage root plus a sibling directory for manifests and the ACL.
///
/// Builds lock the tree down to read-only; dropping the fixture restores
///  writable permissions so the temp dir can be removed.
pub struct Storage {
    pub root: PathBuf,
    pub meta: PathBuf,
    _temp: TempDir,
}

impl Storage {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("data");
        let meta = temp.path().join("meta");
        fs::create_dir(&root).unwrap();
        fs::create_dir(&meta).unwrap();
        Self {
            root,
            meta,
            _temp: temp,
        }
    }

    /// Write a file under the storage root, creating parents. Unlocks first so
    ///  it can be used between builds.
    pub fn write(&self, rel: &str, contents: &[u8]) -> PathBuf {
        self.unlock();
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        self.unlock();
        let path = self.root.join(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn manifest_path(&self, bucket: &str) -> PathBuf {
        self.meta.join(format!("{bucket}.json"))
    }

    /// Build one bucket manifest into `meta/<bucket>.json`, using any previous
    ///  manifest there as the prior.
    pub fn build(&self, bucket: &str, whitelist: Option<&[&str]>) -> Manifest {
        self.build_with(bucket, whitelist, BuildOptions::default())
    }

    pub fn build_with(
        &self,
        bucket: &str,
        whitelist: Option<&[&str]>,
        options: BuildOptions,
    ) -> Manifest {
        let target = self.manifest_path(bucket);
        let mut builder = ManifestBuilder::new(&self.root)
            .prior(&target)
            .options(options);
        if let Some(names) = whitelist {
            builder = builder.whitelist(names.iter().copied());
        }
        builder.build(&target).unwrap()
    }

    pub fn write_acl(&self, body: &str) -> PathBuf {
        let path = self.meta.join("acl.json");
        fs::write(&path, body).unwrap();
        path
    }

    /// Restore owner-writable permissions across the storage tree.
    #[cfg(unix)]
    pub fn unlock(&self) {
        use std::os::unix::fs::PermissionsExt;

        for entry in walkdir::WalkDir::new(&self.root).into_iter().flatten() {
            let file_type = entry.file_type();
            let mode = if file_type.is_dir() {
                0o755
            } else if file_type.is_file() {
                0o644
            } else {
                continue;
            };
            let _ = fs::set_permissions(entry.path(), fs::Permissions::from_mode(mode));
        }
    }

    #[cfg(not(unix))]
    pub fn unlock(&self) {}
}

impl Drop for Storage {
    fn drop(&mut self) {
        self.unlock();
    }
}

/// The entry at `path`, which must exist.
pub fn entry<'a>(manifest: &'a Manifest, path: &str) -> &'a Entry {
    manifest
        .entries()
        .iter()
        .find(|e| e.path() == path)
        .unwrap_or_else(|| panic!("no entry at {path:?}"))
}

pub fn token_for(manifest: &Manifest, path: &str) -> String {
    entry(manifest, path).uuid().to_string()
}

pub fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
