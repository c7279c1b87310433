/**
 * Principals, ACL documents and the merged,
 *  per-principal view of bucket manifests.
 */
pub mod access;
/**
 * Offline manifest builder: scan, lock down,
 *  describe, assign identity, emit.
 */
pub mod builder;
/**
 * The request-time decision chain, composed
 *  into a single state machine.
 */
pub mod gate;
/**
 * Manifest document types and their
 *  on-disk representation.
 */
pub mod manifest;
/**
 * Capability tokens and containment-checked
 *  path resolution.
 */
pub mod resolve;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::access::{AccessResolver, MissingBucketPolicy, Principal, View};
    pub use crate::builder::{BuildOptions, ManifestBuilder};
    pub use crate::gate::{Gate, GateError};
    pub use crate::manifest::{Entry, EntryKind, Manifest};
    pub use crate::resolve::{PathResolver, ResolveError, Resolved, Token};
    pub use crate::version::build_info;
}
