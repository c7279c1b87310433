//! capvault gateway - serves capability-token downloads
//!
//! Sits behind an authenticating proxy that sets the principal header. Each
//! request is authorized against the ACL document as it is on disk right now.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use service::process;
use service::ServiceConfig;

/// capvault gateway - serves capability-token downloads
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the gateway config file (defaults to ~/.capvault/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on for HTTP requests (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (error, warn, info, debug, trace); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Directory for rolling log files (overrides the config file)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => ServiceConfig::default_path()?,
    };
    let mut config = ServiceConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    if let Some(port) = args.port {
        config.listen_port = port;
    }
    if let Some(log_level) = args.log_level {
        config.log_level = log_level;
    }
    if let Some(log_dir) = args.log_dir {
        config.log_dir = Some(log_dir);
    }
    config.validate()?;

    let _guards = process::init_logging(config.log_level()?, config.log_dir.as_deref());

    tracing::info!(
        config = %config_path.display(),
        root = %config.storage_root.display(),
        acl = %config.acl_path.display(),
        port = config.listen_port,
        "starting capvault gateway"
    );

    process::spawn_service(&config).await?;

    tracing::info!("gateway shutdown complete");
    Ok(())
}
