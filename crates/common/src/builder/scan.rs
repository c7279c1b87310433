use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::manifest::EntryKind;

use super::scope::{ScanRoot, Scope};
use super::BuildError;

/// A filesystem entry selected for indexing, before any metadata is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub abs: PathBuf,
    /// Path relative to the manifest base, `/`-separated.
    pub rel: String,
    pub kind: EntryKind,
}

/// Enumerate every regular file and directory under the scope's roots.
///
/// Symlinks are neither followed nor indexed, nor is anything that is not a
///  plain file or directory. Paths in `excluded` (the manifest targets and the
///  directories they are written into) are skipped, directories together with
///  everything below them. The result is in byte-wise path order.
pub fn scan(scope: &Scope, excluded: &HashSet<PathBuf>) -> Result<Vec<Candidate>, BuildError> {
    let mut candidates = Vec::new();
    for root in &scope.roots {
        scan_root(root, excluded, &mut candidates)?;
    }
    candidates.sort_by(|a, b| a.rel.cmp(&b.rel));
    Ok(candidates)
}

fn scan_root(
    root: &ScanRoot,
    excluded: &HashSet<PathBuf>,
    out: &mut Vec<Candidate>,
) -> Result<(), BuildError> {
    let mut walk = WalkDir::new(&root.dir)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();
    while let Some(item) = walk.next() {
        let item = item?;
        let file_type = item.file_type();

        if file_type.is_symlink() {
            tracing::debug!(path = %item.path().display(), "skipping symlink");
            continue;
        }

        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            tracing::debug!(path = %item.path().display(), "skipping special file");
            continue;
        };

        if excluded.contains(item.path()) {
            tracing::info!(path = %item.path().display(), "excluding manifest location from scan");
            if kind == EntryKind::Directory {
                walk.skip_current_dir();
            }
            continue;
        }

        let Some(rel) = relative_name(&root.dir, &root.prefix, item.path()) else {
            tracing::warn!(path = %item.path().display(), "skipping entry with non UTF-8 name");
            if kind == EntryKind::Directory {
                walk.skip_current_dir();
            }
            continue;
        };

        out.push(Candidate {
            abs: item.into_path(),
            rel,
            kind,
        });
    }
    Ok(())
}

/// Build the `/`-joined manifest path for `path` under `dir`.
fn relative_name(dir: &Path, prefix: &str, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(dir).ok()?;
    let mut parts: Vec<&str> = Vec::new();
    if !prefix.is_empty() {
        parts.push(prefix);
    }
    for component in rel.components() {
        parts.push(component.as_os_str().to_str()?);
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::builder::scope::resolve_scope;

    #[test]
    fn test_scan_orders_by_path_bytes() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/c.txt"), b"c").unwrap();
        fs::write(dir.path().join("a-z.txt"), b"z").unwrap();
        fs::write(dir.path().join("a/d.txt"), b"d").unwrap();

        let scope = resolve_scope(dir.path(), None).unwrap();
        let found = scan(&scope, &HashSet::new()).unwrap();
        let rels: Vec<&str> = found.iter().map(|c| c.rel.as_str()).collect();

        assert_eq!(rels, vec!["a", "a-z.txt", "a/b", "a/b/c.txt", "a/d.txt"]);
        assert_eq!(found[0].kind, EntryKind::Directory);
        assert_eq!(found[1].kind, EntryKind::File);
    }

    #[test]
    fn test_scan_prefixes_multi_subtree_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("public")).unwrap();
        fs::create_dir(dir.path().join("team")).unwrap();
        fs::write(dir.path().join("public/a.txt"), b"a").unwrap();
        fs::write(dir.path().join("team/b.txt"), b"b").unwrap();

        let names = vec!["team".to_string(), "public".to_string()];
        let scope = resolve_scope(dir.path(), Some(&names)).unwrap();
        let rels: Vec<String> = scan(&scope, &HashSet::new())
            .unwrap()
            .into_iter()
            .map(|c| c.rel)
            .collect();

        assert_eq!(rels, vec!["public/a.txt", "team/b.txt"]);
    }

    #[test]
    fn test_scan_skips_excluded_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("data.bin"), b"d").unwrap();
        fs::write(dir.path().join("manifest.json"), b"{}").unwrap();

        let scope = resolve_scope(dir.path(), None).unwrap();
        let excluded = HashSet::from([scope.root.join("manifest.json")]);
        let rels: Vec<String> = scan(&scope, &excluded)
            .unwrap()
            .into_iter()
            .map(|c| c.rel)
            .collect();

        assert_eq!(rels, vec!["data.bin"]);
    }

    #[test]
    fn test_scan_skips_excluded_directory_contents() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("meta")).unwrap();
        fs::write(dir.path().join("meta/public.json"), b"{}").unwrap();
        fs::write(dir.path().join("meta/acl.json"), b"{}").unwrap();
        fs::write(dir.path().join("notes.txt"), b"n").unwrap();

        let scope = resolve_scope(dir.path(), None).unwrap();
        let excluded = HashSet::from([scope.root.join("meta")]);
        let rels: Vec<String> = scan(&scope, &excluded)
            .unwrap()
            .into_iter()
            .map(|c| c.rel)
            .collect();

        assert_eq!(rels, vec!["notes.txt"]);
    }

    // macOS filesystems refuse non UTF-8 names outright
    #[cfg(target_os = "linux")]
    #[test]
    fn test_scan_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let bad_file = dir.path().join(OsStr::from_bytes(b"bad\xff.txt"));
        let bad_dir = dir.path().join(OsStr::from_bytes(b"dir\xfe"));
        fs::write(&bad_file, b"x").unwrap();
        fs::create_dir(&bad_dir).unwrap();
        fs::write(bad_dir.join("inner.txt"), b"i").unwrap();
        fs::write(dir.path().join("good.txt"), b"g").unwrap();

        let scope = resolve_scope(dir.path(), None).unwrap();
        let found = scan(&scope, &HashSet::new()).unwrap();
        let rels: Vec<&str> = found.iter().map(|c| c.rel.as_str()).collect();

        assert_eq!(rels, vec!["good.txt"]);
        assert!(found.iter().all(|c| !c.abs.starts_with(&bad_dir)));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_never_follows_symlinks() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), b"s").unwrap();

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("real.txt"), b"r").unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("link.txt"))
            .unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linkdir")).unwrap();

        let scope = resolve_scope(dir.path(), None).unwrap();
        let rels: Vec<String> = scan(&scope, &HashSet::new())
            .unwrap()
            .into_iter()
            .map(|c| c.rel)
            .collect();

        assert_eq!(rels, vec!["real.txt"]);
    }
}
