//! Request gate
//!
//! Runs one authorization decision end to end:
//!
//! ```text
//! Received -> SyntaxChecked -> ViewResolved -> EntryFound -> Resolved
//!     |             |                |              |
//!     +-- Malformed +-- Config error +-- NotVisible +-- Directory / OutsideRoot / Missing
//! ```
//!
//! The HTTP gateway and the operator CLI both go through [`Gate::resolve`], so
//!  the checks and their order are the same everywhere.

use crate::access::{AccessError, AccessResolver, Principal, View};
use crate::resolve::{PathResolver, ResolveError, Resolved, Token};

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The request is refused. Never reveal which variant to a client.
    #[error("denied: {0}")]
    Denied(#[from] ResolveError),
    /// ACL or manifest state is unusable; the decision failed closed.
    #[error("access configuration unusable: {0}")]
    Config(#[from] AccessError),
}

/// How far a request got before it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    SyntaxChecked,
    ViewResolved,
    EntryFound,
    Resolved,
}

#[derive(Debug)]
pub struct Gate {
    access: AccessResolver,
    paths: PathResolver,
}

impl Gate {
    pub fn new(access: AccessResolver, paths: PathResolver) -> Self {
        Self { access, paths }
    }

    pub fn access(&self) -> &AccessResolver {
        &self.access
    }

    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    pub fn view(&self, principal: Option<&Principal>) -> Result<View, GateError> {
        Ok(self.access.resolve_view(principal)?)
    }

    /// Resolve a raw client token for `principal`.
    pub fn resolve(&self, principal: Option<&Principal>, raw: &str) -> Result<Resolved, GateError> {
        let mut stage = Stage::Received;
        let outcome = self.advance(principal, raw, &mut stage);
        match &outcome {
            Ok(resolved) => tracing::debug!(uuid = %resolved.uuid, "token resolved"),
            Err(GateError::Denied(reason)) => tracing::debug!(
                ?stage,
                kind = ?reason.kind(),
                %reason,
                "token denied"
            ),
            Err(GateError::Config(e)) => tracing::error!(?stage, error = %e, "access decision failed closed"),
        }
        outcome
    }

    fn advance(
        &self,
        principal: Option<&Principal>,
        raw: &str,
        stage: &mut Stage,
    ) -> Result<Resolved, GateError> {
        let token = Token::parse(raw)?;
        *stage = Stage::SyntaxChecked;

        let view = self.access.resolve_view(principal)?;
        *stage = Stage::ViewResolved;

        let entry = view
            .get(token.uuid())
            .ok_or(ResolveError::NotVisible(*token.uuid()))?;
        *stage = Stage::EntryFound;

        let resolved = self.paths.resolve_entry(entry)?;
        *stage = Stage::Resolved;
        Ok(resolved)
    }
}
