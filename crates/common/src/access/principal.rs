//! # Principals
//!
//! A principal is the identity an upstream authentication layer vouches for.
//!
//! ## Trust Model
//!
//! This crate performs no credential checking. A [`Principal`] must only ever
//! be constructed from the trusted upstream channel (for the gateway, a header
//! set by the authenticating proxy), never from a request parameter or body.

use serde::{Deserialize, Serialize};

/// An authenticated identity, as supplied by the upstream authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Wrap an identity string. Surrounding whitespace is trimmed; an empty
    ///  identity is no identity at all.
    pub fn new(identity: impl AsRef<str>) -> Option<Self> {
        let identity = identity.as_ref().trim();
        if identity.is_empty() {
            None
        } else {
            Some(Self(identity.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
