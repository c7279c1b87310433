use std::fmt;
use std::path::PathBuf;

use clap::Args;

use common::builder::{BuildError, BuildOptions, ManifestBuilder};
use common::manifest::Stats;

#[derive(Args, Debug, Clone)]
pub struct Build {
    /// Storage root to index
    #[arg(long)]
    pub root: PathBuf,

    /// Where to write the manifest
    #[arg(long)]
    pub out: PathBuf,

    /// Previous manifest to carry identifiers forward from
    #[arg(long)]
    pub prior: Option<PathBuf>,

    /// Only index these top-level subtrees of the root
    #[arg(long, value_delimiter = ',')]
    pub only: Option<Vec<String>>,

    /// Leave permissions on the tree as they are
    #[arg(long)]
    pub no_lockdown: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildOpError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("build task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug)]
pub struct BuildSummary {
    pub out: PathBuf,
    pub base: String,
    pub stats: Stats,
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = if self.base.is_empty() { "." } else { &self.base };
        write!(
            f,
            "wrote {} (base {}): {} entries, {} files, {} dirs, {} bytes",
            self.out.display(),
            base,
            self.stats.total_entries,
            self.stats.total_files,
            self.stats.total_dirs,
            self.stats.total_bytes
        )
    }
}

impl Build {
    fn builder(&self) -> ManifestBuilder {
        let mut builder = ManifestBuilder::new(&self.root).options(BuildOptions {
            lock_permissions: !self.no_lockdown,
        });
        if let Some(only) = &self.only {
            builder = builder.whitelist(only.iter().cloned());
        }
        if let Some(prior) = &self.prior {
            builder = builder.prior(prior);
        }
        builder
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Build {
    type Error = BuildOpError;
    type Output = BuildSummary;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let builder = self.builder();
        let out = self.out.clone();

        // the walk and hashing are blocking filesystem work
        let manifest = tokio::task::spawn_blocking(move || builder.build(&out)).await??;

        Ok(BuildSummary {
            out: self.out.clone(),
            base: manifest.base().to_string(),
            stats: *manifest.stats(),
        })
    }
}
