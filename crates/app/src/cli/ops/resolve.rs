use std::path::PathBuf;

use clap::Args;

use common::access::Principal;
use common::gate::{Gate, GateError};
use common::resolve::{DenialKind, PathResolver, ResolveError, RootError};

use crate::cli::op::MissingAcl;

/// Run one gate decision and report why it went the way it did.
///
/// Unlike the gateway, this prints the internal denial reason. It is meant
///  for operators debugging a grant, not for clients.
#[derive(Args, Debug, Clone)]
pub struct Resolve {
    /// Storage root the manifests index
    #[arg(long)]
    pub root: PathBuf,

    /// Principal making the request; omit for an anonymous request
    #[arg(long)]
    pub principal: Option<String>,

    /// Fail when a granted bucket has no manifest instead of treating it as empty
    #[arg(long)]
    pub strict_buckets: bool,

    /// Capability token to resolve
    pub token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveOpError {
    #[error(transparent)]
    MissingAcl(#[from] MissingAcl),
    #[error(transparent)]
    Root(#[from] RootError),
    #[error("denied ({}): {reason}", describe(.kind))]
    Denied {
        kind: DenialKind,
        reason: ResolveError,
    },
    #[error(transparent)]
    Config(common::access::AccessError),
    #[error("resolve task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn describe(kind: &DenialKind) -> &'static str {
    match kind {
        DenialKind::Validation => "validation",
        DenialKind::AuthorizationGap => "not granted",
    }
}

impl From<GateError> for ResolveOpError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::Denied(reason) => ResolveOpError::Denied {
                kind: reason.kind(),
                reason,
            },
            GateError::Config(e) => ResolveOpError::Config(e),
        }
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Resolve {
    type Error = ResolveOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let access = ctx.access(self.strict_buckets)?;
        let paths = PathResolver::new(&self.root)?;
        let gate = Gate::new(access, paths);
        let principal = self.principal.as_deref().and_then(Principal::new);
        let token = self.token.clone();

        let resolved = tokio::task::spawn_blocking(move || gate.resolve(principal.as_ref(), &token)).await??;

        Ok(format!(
            "{}  {}  {} bytes  {}",
            resolved.uuid,
            resolved.mime,
            resolved.size,
            resolved.path.display()
        ))
    }
}
