//! Manifest data structures
//!
//! A manifest is the catalog of one bucket: a header with statistics and an
//!  ordered list of [`Entry`] values, each naming a file or directory under the
//!  storage root by an opaque identifier.
//!
//! ```text
//! Manifest { version, generatedAt, base?, stats }
//!     |
//!     +-- Entry { uuid, path, type, size, hash, mtime, mode, mime? }
//!     +-- Entry ...
//! ```
//!
//! Manifests are produced by the [`builder`](crate::builder) and are never
//!  patched in place; a rebuild writes a complete new document and atomically
//!  renames it over the old one.

mod document;
mod entry;
mod maybe_mime;
mod mode;

pub use document::{Manifest, ManifestError, Stats, MANIFEST_FILE_MODE, MANIFEST_VERSION};
pub use entry::{Entry, EntryKind};
pub use maybe_mime::MaybeMime;
