use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::manifest::{Entry, Manifest, Stats};

/// An entry together with the base directory its path is relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleEntry {
    base: Arc<str>,
    entry: Entry,
}

impl VisibleEntry {
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Storage-root-relative location: `base/path`, or just `path` at an empty base.
    pub fn storage_path(&self) -> PathBuf {
        let mut rel = PathBuf::new();
        if !self.base.is_empty() {
            rel.push(&*self.base);
        }
        for segment in self.entry.path().split('/') {
            rel.push(segment);
        }
        rel
    }
}

/// The merged, de-duplicated set of entries one principal may see.
///
/// Which bucket an entry came from is not retained.
#[derive(Debug, Clone, Default)]
pub struct View {
    entries: Vec<VisibleEntry>,
    index: HashMap<Uuid, usize>,
    stats: Stats,
}

impl View {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge manifests in the order given. The first occurrence of an
    ///  identifier wins; later duplicates are dropped.
    pub fn from_manifests<'a>(manifests: impl IntoIterator<Item = &'a Manifest>) -> Self {
        let mut entries = Vec::new();
        let mut index = HashMap::new();

        for manifest in manifests {
            let base: Arc<str> = Arc::from(manifest.base());
            for entry in manifest.entries() {
                if index.contains_key(entry.uuid()) {
                    continue;
                }
                index.insert(*entry.uuid(), entries.len());
                entries.push(VisibleEntry {
                    base: base.clone(),
                    entry: entry.clone(),
                });
            }
        }

        let stats = Stats::from_entries(entries.iter().map(|v| &v.entry));
        Self {
            entries,
            index,
            stats,
        }
    }

    pub fn get(&self, uuid: &Uuid) -> Option<&VisibleEntry> {
        self.index.get(uuid).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[VisibleEntry] {
        &self.entries
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
