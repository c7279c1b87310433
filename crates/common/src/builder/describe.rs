use std::fs::{self, File};
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use mime::Mime;
use sha2::{Digest, Sha256};

use uuid::Uuid;

use crate::manifest::{Entry, EntryKind, MaybeMime};

use super::lockdown::permission_bits;
use super::scan::Candidate;
use super::BuildError;

/// Content identity of a described file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub hash: String,
    pub mime: Mime,
}

/// Everything the manifest records about an entry except its identifier.
///  `content` is present exactly for files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Described {
    pub rel: String,
    pub size: u64,
    pub mtime: DateTime<Utc>,
    pub mode: u32,
    pub content: Option<FileContent>,
}

impl Described {
    pub fn kind(&self) -> EntryKind {
        match self.content {
            Some(_) => EntryKind::File,
            None => EntryKind::Directory,
        }
    }

    pub fn hash(&self) -> Option<&str> {
        self.content.as_ref().map(|c| c.hash.as_str())
    }

    pub fn into_entry(self, uuid: Uuid) -> Entry {
        match self.content {
            Some(FileContent { hash, mime }) => {
                Entry::file(uuid, self.rel, self.size, hash, self.mtime, self.mode, mime)
            }
            None => Entry::directory(uuid, self.rel, self.mtime, self.mode),
        }
    }
}

/// Read metadata (and for files, hash the full contents) for one candidate.
pub fn describe(candidate: Candidate) -> Result<Described, BuildError> {
    let io_err = |source| BuildError::Io {
        path: candidate.abs.clone(),
        source,
    };

    let meta = fs::symlink_metadata(&candidate.abs).map_err(io_err)?;
    let still_same_kind = match candidate.kind {
        EntryKind::File => meta.file_type().is_file(),
        EntryKind::Directory => meta.file_type().is_dir(),
    };
    if !still_same_kind {
        return Err(BuildError::Changed(candidate.abs.clone()));
    }

    let mtime = DateTime::<Utc>::from(meta.modified().map_err(io_err)?);
    let mode = permission_bits(&meta);

    let described = match candidate.kind {
        EntryKind::Directory => Described {
            rel: candidate.rel,
            size: 0,
            mtime,
            mode,
            content: None,
        },
        EntryKind::File => {
            let hash = hash_file(&candidate.abs).map_err(io_err)?;
            let mime = MaybeMime::classify(Path::new(&candidate.rel));
            Described {
                rel: candidate.rel,
                size: meta.len(),
                mtime,
                mode,
                content: Some(FileContent { hash, mime }),
            }
        }
    };
    Ok(described)
}

/// Hex-encoded SHA-256 of a file's full contents.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
