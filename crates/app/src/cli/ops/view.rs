use std::fmt::Write;

use clap::Args;

use common::access::{AccessError, Principal};

use crate::cli::op::MissingAcl;

#[derive(Args, Debug, Clone)]
pub struct View {
    /// Principal to compute the view for; omit for the anonymous view
    #[arg(long)]
    pub principal: Option<String>,

    /// Fail when a granted bucket has no manifest instead of treating it as empty
    #[arg(long)]
    pub strict_buckets: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error(transparent)]
    MissingAcl(#[from] MissingAcl),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("view task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for View {
    type Error = ViewError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let access = ctx.access(self.strict_buckets)?;
        let principal = self.principal.as_deref().and_then(Principal::new);

        let view = tokio::task::spawn_blocking(move || access.resolve_view(principal.as_ref())).await??;

        let mut output = String::new();
        for visible in view.entries() {
            let entry = visible.entry();
            let _ = writeln!(
                output,
                "{}  {:<9}  {:>12}  {}",
                entry.uuid(),
                entry.kind(),
                entry.size(),
                entry.path()
            );
        }
        let stats = view.stats();
        let _ = write!(
            output,
            "{} entries, {} files, {} dirs, {} bytes",
            stats.total_entries, stats.total_files, stats.total_dirs, stats.total_bytes
        );
        Ok(output)
    }
}
