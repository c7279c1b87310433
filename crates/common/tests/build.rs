//! Integration tests for manifest builds

mod common;

use std::collections::HashSet;
use std::fs;

use ::common::builder::{BuildError, BuildOptions, ManifestBuilder};
use ::common::manifest::{EntryKind, Manifest};
use self::common::Storage;

#[test]
fn test_whitelisted_subtree_content_change_rotates_identifier() {
    let storage = Storage::new();
    storage.write("public/a.txt", b"hi");
    storage.write("team/b.txt", b"team only");

    let first = storage.build("public", Some(&["public"]));
    assert_eq!(first.base(), "public");
    assert_eq!(first.entries().len(), 1);
    let entry = &first.entries()[0];
    assert_eq!(entry.path(), "a.txt");
    assert_eq!(entry.kind(), EntryKind::File);
    let u1 = *entry.uuid();

    storage.write("public/a.txt", b"hello there");
    let second = storage.build("public", Some(&["public"]));
    assert_eq!(second.entries().len(), 1);
    let u2 = *second.entries()[0].uuid();
    assert_eq!(second.entries()[0].path(), "a.txt");
    assert_ne!(u1, u2);
    assert!(second.entries().iter().all(|e| *e.uuid() != u1));

    let third = storage.build("public", Some(&["public"]));
    assert_eq!(*third.entries()[0].uuid(), u2);
}

#[test]
fn test_rebuild_without_changes_keeps_every_identifier() {
    let storage = Storage::new();
    storage.write("docs/readme.txt", b"read me");
    storage.write("docs/nested/deep.bin", &[0u8, 1, 2, 3]);
    storage.write("top.json", br#"{"k":"v"}"#);
    storage.mkdir("empty");

    let first = storage.build("all", None);
    let second = storage.build("all", None);

    let ids = |m: &Manifest| {
        m.entries()
            .iter()
            .map(|e| (e.path().to_string(), *e.uuid()))
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.stats(), second.stats());
}

#[test]
fn test_entries_are_ordered_and_unique() {
    let storage = Storage::new();
    for rel in ["b/z.txt", "a/y.txt", "a-b.txt", "a/x/w.txt", "c.txt", "B.txt"] {
        storage.write(rel, rel.as_bytes());
    }

    let manifest = storage.build("all", None);
    let paths: Vec<&str> = manifest.entries().iter().map(|e| e.path()).collect();
    let mut sorted = paths.clone();
    sorted.sort();
    assert_eq!(paths, sorted);
    assert_eq!(
        paths,
        vec!["B.txt", "a", "a-b.txt", "a/x", "a/x/w.txt", "a/y.txt", "b", "b/z.txt", "c.txt"]
    );

    let unique: HashSet<_> = manifest.entries().iter().map(|e| *e.uuid()).collect();
    assert_eq!(unique.len(), manifest.entries().len());

    let reloaded = Manifest::load(&storage.manifest_path("all")).unwrap();
    assert_eq!(reloaded.entries(), manifest.entries());
}

#[test]
fn test_stats_and_directory_entries() {
    let storage = Storage::new();
    storage.write("d/one.txt", b"1");
    storage.write("d/two.txt", b"22");

    let manifest = storage.build("all", None);
    let stats = manifest.stats();
    assert_eq!(stats.total_entries, 3);
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.total_dirs, 1);
    assert_eq!(stats.total_bytes, 3);

    let dir = common::entry(&manifest, "d");
    assert!(dir.is_dir());
    assert_eq!(dir.size(), 0);
    assert_eq!(dir.hash(), None);
    assert_eq!(dir.mime(), None);

    let file = common::entry(&manifest, "d/one.txt");
    assert_eq!(file.hash().map(str::len), Some(64));
    assert_eq!(file.mime().map(|m| m.as_ref()), Some("text/plain"));
}

#[test]
fn test_missing_whitelist_entry_is_skipped() {
    let storage = Storage::new();
    storage.write("public/a.txt", b"hi");

    let manifest = storage.build("mixed", Some(&["public", "ghost"]));
    // two subtrees declared, so paths keep their subtree prefix
    assert_eq!(manifest.base(), "");
    let paths: Vec<&str> = manifest.entries().iter().map(|e| e.path()).collect();
    assert_eq!(paths, vec!["public/a.txt"]);
}

#[test]
fn test_no_scan_roots_is_fatal() {
    let storage = Storage::new();
    storage.write("public/a.txt", b"hi");
    storage.write("not-a-dir", b"file");

    let result = ManifestBuilder::new(&storage.root)
        .whitelist(["ghost", "not-a-dir"])
        .build(&storage.manifest_path("none"));
    assert!(matches!(result, Err(BuildError::NoScanRoots)));
    assert!(!common::exists(&storage.manifest_path("none")));
}

#[test]
fn test_invalid_whitelist_names_are_rejected() {
    let storage = Storage::new();
    storage.write("public/a.txt", b"hi");

    for bad in ["..", "public/../team", "a/b", ".", ""] {
        let result = ManifestBuilder::new(&storage.root)
            .whitelist([bad])
            .build(&storage.manifest_path("bad"));
        assert!(
            matches!(result, Err(BuildError::InvalidScope(_))),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn test_manifest_inside_root_is_excluded() {
    let storage = Storage::new();
    storage.write("a.txt", b"a");
    let target = storage.root.join("index.json");

    let first = ManifestBuilder::new(&storage.root)
        .options(BuildOptions {
            lock_permissions: false,
        })
        .build(&target)
        .unwrap();
    let second = ManifestBuilder::new(&storage.root)
        .prior(&target)
        .options(BuildOptions {
            lock_permissions: false,
        })
        .build(&target)
        .unwrap();

    for manifest in [&first, &second] {
        let paths: Vec<&str> = manifest.entries().iter().map(|e| e.path()).collect();
        assert_eq!(paths, vec!["a.txt"]);
    }
    assert_eq!(first.entries()[0].uuid(), second.entries()[0].uuid());
}

#[test]
fn test_deleted_file_disappears() {
    let storage = Storage::new();
    storage.write("keep.txt", b"k");
    let doomed = storage.write("drop.txt", b"d");

    let first = storage.build("all", None);
    assert_eq!(first.entries().len(), 2);

    storage.unlock();
    fs::remove_file(doomed).unwrap();
    let second = storage.build("all", None);
    assert_eq!(second.entries().len(), 1);
    assert_eq!(
        second.entries()[0].uuid(),
        common::entry(&first, "keep.txt").uuid()
    );
}

#[cfg(unix)]
mod unix {
    use std::fs;
    use std::os::unix::fs::{symlink, PermissionsExt};

    use ::common::builder::{BuildOptions, LOCKED_DIR_MODE, LOCKED_FILE_MODE};
    use ::common::manifest::MANIFEST_FILE_MODE;

    use super::common::{self, Storage};

    fn mode_of(path: &std::path::Path) -> u32 {
        fs::metadata(path).unwrap().permissions().mode() & 0o7777
    }

    #[test]
    fn test_lockdown_applies_and_records_modes() {
        let storage = Storage::new();
        let script = storage.write("bin/run.sh", b"#!/bin/sh\n");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o775)).unwrap();

        let manifest = storage.build("all", None);

        assert_eq!(common::entry(&manifest, "bin").mode(), LOCKED_DIR_MODE);
        assert_eq!(common::entry(&manifest, "bin/run.sh").mode(), LOCKED_FILE_MODE);
        assert_eq!(mode_of(&storage.root.join("bin")), LOCKED_DIR_MODE);
        assert_eq!(mode_of(&script), LOCKED_FILE_MODE);
        assert_eq!(mode_of(&storage.manifest_path("all")), MANIFEST_FILE_MODE);

        // the storage root is not an entry and keeps its permissions
        assert_ne!(mode_of(&storage.root), LOCKED_DIR_MODE);
    }

    #[test]
    fn test_manifest_directory_inside_root_stays_writable() {
        let storage = Storage::new();
        storage.write("a.txt", b"a");
        storage.write("meta/notes.txt", b"operator notes");
        let meta = storage.root.join("meta");
        let target = meta.join("bucket.json");

        let first = ::common::builder::ManifestBuilder::new(&storage.root)
            .build(&target)
            .unwrap();
        let second = ::common::builder::ManifestBuilder::new(&storage.root)
            .prior(&target)
            .build(&target)
            .unwrap();

        for manifest in [&first, &second] {
            let paths: Vec<&str> = manifest.entries().iter().map(|e| e.path()).collect();
            assert_eq!(paths, vec!["a.txt"]);
        }
        assert_eq!(first.entries()[0].uuid(), second.entries()[0].uuid());
        assert_eq!(mode_of(&storage.root.join("a.txt")), LOCKED_FILE_MODE);
        assert_ne!(mode_of(&meta), LOCKED_DIR_MODE);
        assert_ne!(mode_of(&meta.join("notes.txt")), LOCKED_FILE_MODE);
        assert_eq!(mode_of(&target), MANIFEST_FILE_MODE);
    }

    #[test]
    fn test_no_lockdown_leaves_tree_alone() {
        let storage = Storage::new();
        let file = storage.write("a.txt", b"a");
        fs::set_permissions(&file, fs::Permissions::from_mode(0o640)).unwrap();

        let manifest = storage.build_with(
            "all",
            None,
            BuildOptions {
                lock_permissions: false,
            },
        );
        assert_eq!(mode_of(&file), 0o640);
        assert_eq!(common::entry(&manifest, "a.txt").mode(), 0o640);
    }

    #[test]
    fn test_symlinks_are_never_indexed() {
        let storage = Storage::new();
        storage.write("real.txt", b"real");
        storage.mkdir("realdir");
        symlink(storage.root.join("real.txt"), storage.root.join("link.txt")).unwrap();
        symlink("/etc", storage.root.join("etc-link")).unwrap();

        let manifest = storage.build("all", None);
        let paths: Vec<&str> = manifest.entries().iter().map(|e| e.path()).collect();
        assert_eq!(paths, vec!["real.txt", "realdir"]);
    }
}
