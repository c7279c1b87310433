use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::manifest::{Entry, Manifest};

/// Build-time carry-forward table: `(path, hash-or-empty) -> identifier`.
///
/// An identifier survives a rebuild only when both the path and the content
///  hash are unchanged. The table also tracks every identifier handed out in
///  the current build so a crafted prior manifest cannot make two entries share one.
#[derive(Debug, Default)]
pub struct IdentityTable {
    known: HashMap<(String, String), Uuid>,
    issued: HashSet<Uuid>,
}

impl IdentityTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_manifest(prior: &Manifest) -> Self {
        let known = prior
            .entries()
            .iter()
            .map(|entry| (entry.identity_key(), *entry.uuid()))
            .collect();
        Self {
            known,
            issued: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Identifier for `path` with content `hash`. The carry-forward lookup always
    ///  happens before a fresh identifier is minted.
    pub fn assign(&mut self, path: &str, hash: Option<&str>) -> Uuid {
        let key = (path.to_string(), hash.unwrap_or_default().to_string());
        if let Some(uuid) = self.known.get(&key).copied() {
            if self.issued.insert(uuid) {
                return uuid;
            }
            tracing::warn!(%path, %uuid, "prior identifier already issued in this build, minting a new one");
        }
        loop {
            let uuid = Uuid::new_v4();
            if self.issued.insert(uuid) {
                return uuid;
            }
        }
    }

    /// Whether `entry`'s identifier would be carried forward unchanged.
    pub fn carries(&self, entry: &Entry) -> bool {
        self.known.get(&entry.identity_key()) == Some(entry.uuid())
    }
}
