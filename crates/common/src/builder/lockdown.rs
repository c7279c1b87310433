use std::fs::Metadata;

use crate::manifest::EntryKind;

use super::scan::Candidate;
use super::BuildError;

/// Mode forced onto every indexed directory: read and traverse only.
pub const LOCKED_DIR_MODE: u32 = 0o555;
/// Mode forced onto every indexed file: read only, never executable.
pub const LOCKED_FILE_MODE: u32 = 0o444;

/// Fail before touching the tree if permission bits cannot be managed here.
pub fn ensure_supported() -> Result<(), BuildError> {
    if cfg!(unix) {
        Ok(())
    } else {
        Err(BuildError::Unsupported(
            "permission lockdown requires unix permission bits",
        ))
    }
}

pub fn locked_mode(kind: EntryKind) -> u32 {
    match kind {
        EntryKind::Directory => LOCKED_DIR_MODE,
        EntryKind::File => LOCKED_FILE_MODE,
    }
}

/// Force read-only permissions onto every candidate.
///
/// Only entries that will appear in the manifest are touched; scan roots and
///  the storage root keep their permissions.
#[cfg(unix)]
pub fn lock_down(candidates: &[Candidate]) -> Result<(), BuildError> {
    use std::os::unix::fs::PermissionsExt;

    for candidate in candidates {
        let mode = locked_mode(candidate.kind);
        std::fs::set_permissions(&candidate.abs, std::fs::Permissions::from_mode(mode)).map_err(
            |source| BuildError::Io {
                path: candidate.abs.clone(),
                source,
            },
        )?;
    }
    tracing::debug!(count = candidates.len(), "permissions locked down");
    Ok(())
}

#[cfg(not(unix))]
pub fn lock_down(_candidates: &[Candidate]) -> Result<(), BuildError> {
    ensure_supported()
}

/// Permission bits as recorded in the manifest.
#[cfg(unix)]
pub fn permission_bits(meta: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
pub fn permission_bits(meta: &Metadata) -> u32 {
    match (meta.is_dir(), meta.permissions().readonly()) {
        (true, true) => LOCKED_DIR_MODE,
        (true, false) => 0o755,
        (false, true) => LOCKED_FILE_MODE,
        (false, false) => 0o644,
    }
}
