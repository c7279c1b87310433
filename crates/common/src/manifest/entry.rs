use chrono::{DateTime, Utc};
use mime::Mime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::maybe_mime::MaybeMime;

/// What an entry names on disk. Symlinks and special files are never indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "directory"),
        }
    }
}

/// A single indexed filesystem entry.
///
/// The `uuid` is the capability token handed to clients. It names a specific
///  content-at-path: a content change at a fixed path gets a fresh identifier
///  on rebuild, and a rename does too.
///
/// `path` is relative to the manifest's base, `/`-separated, with no leading
///  separator. Entries read back from disk are not trusted to honor that; the
///  path resolver re-checks containment on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    uuid: Uuid,
    path: String,
    #[serde(rename = "type")]
    kind: EntryKind,
    size: u64,
    /// Hex SHA-256 of the file contents. Always `None` for directories.
    hash: Option<String>,
    mtime: DateTime<Utc>,
    #[serde(with = "super::mode")]
    mode: u32,
    #[serde(default, skip_serializing_if = "MaybeMime::is_none")]
    mime: MaybeMime,
}

impl Entry {
    pub fn file(
        uuid: Uuid,
        path: impl Into<String>,
        size: u64,
        hash: impl Into<String>,
        mtime: DateTime<Utc>,
        mode: u32,
        mime: Mime,
    ) -> Self {
        Self {
            uuid,
            path: path.into(),
            kind: EntryKind::File,
            size,
            hash: Some(hash.into()),
            mtime,
            mode,
            mime: MaybeMime(Some(mime)),
        }
    }

    pub fn directory(uuid: Uuid, path: impl Into<String>, mtime: DateTime<Utc>, mode: u32) -> Self {
        Self {
            uuid,
            path: path.into(),
            kind: EntryKind::Directory,
            size: 0,
            hash: None,
            mtime,
            mode,
            mime: MaybeMime(None),
        }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn mtime(&self) -> &DateTime<Utc> {
        &self.mtime
    }

    pub fn mode(&self) -> u32 {
        self.mode
    }

    pub fn mime(&self) -> Option<&Mime> {
        self.mime.as_mime()
    }

    /// Key used for identity carry-forward between builds.
    pub(crate) fn identity_key(&self) -> (String, String) {
        (
            self.path.clone(),
            self.hash.clone().unwrap_or_default(),
        )
    }
}
