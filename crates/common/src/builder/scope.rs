use std::fs;
use std::path::{Component, Path, PathBuf};

use super::BuildError;

/// One directory the scan starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRoot {
    /// Canonical absolute directory.
    pub dir: PathBuf,
    /// Prefix prepended to entry paths found under `dir` (empty or `"name"`).
    pub prefix: String,
}

/// The resolved set of directories a build indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Canonical storage root.
    pub root: PathBuf,
    /// Storage-root-relative directory the emitted entry paths are relative to.
    pub base: String,
    pub roots: Vec<ScanRoot>,
}

/// Resolve the storage root and optional whitelist into concrete scan roots.
///
/// A whitelist naming exactly one subtree makes that subtree the manifest base,
///  so its entries are relative to it. Several subtrees keep the storage root
///  as base and prefix each entry with its subtree name. The base is derived
///  from the declared whitelist, not from what happens to exist on disk, so a
///  subtree appearing later does not shift every path.
pub fn resolve_scope(root: &Path, whitelist: Option<&[String]>) -> Result<Scope, BuildError> {
    let root = fs::canonicalize(root).map_err(|source| BuildError::Root {
        path: root.to_path_buf(),
        source,
    })?;
    if !root.is_dir() {
        return Err(BuildError::RootNotDirectory(root));
    }

    let names = match whitelist {
        None => {
            return Ok(Scope {
                roots: vec![ScanRoot {
                    dir: root.clone(),
                    prefix: String::new(),
                }],
                root,
                base: String::new(),
            });
        }
        Some(names) => dedup_names(names)?,
    };

    let single = names.len() == 1;
    let base = if single {
        names[0].clone()
    } else {
        String::new()
    };

    let mut roots = Vec::with_capacity(names.len());
    for name in names {
        let dir = root.join(&name);
        match fs::symlink_metadata(&dir) {
            Ok(meta) if meta.file_type().is_dir() => {
                roots.push(ScanRoot {
                    dir,
                    prefix: if single { String::new() } else { name },
                });
            }
            Ok(_) => {
                tracing::warn!(subtree = %name, "whitelisted subtree is not a directory, skipping");
            }
            Err(e) => {
                tracing::warn!(subtree = %name, error = %e, "whitelisted subtree not found, skipping");
            }
        }
    }

    if roots.is_empty() {
        return Err(BuildError::NoScanRoots);
    }

    Ok(Scope { root, base, roots })
}

/// Validate whitelist names and drop repeats, keeping first-seen order.
fn dedup_names(names: &[String]) -> Result<Vec<String>, BuildError> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if !is_plain_component(name) {
            return Err(BuildError::InvalidScope(name.to_string()));
        }
        if !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    Ok(out)
}

fn is_plain_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(c)), None) if c == name
    )
}
