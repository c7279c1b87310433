pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "capvault")]
#[command(about = "Build capability manifests and inspect access decisions", version)]
pub struct Args {
    /// ACL document used by `view` and `resolve`
    #[arg(long, global = true)]
    pub acl: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: crate::Command,
}
