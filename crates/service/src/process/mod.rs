pub mod utils;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use tokio::time::timeout;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::http;
use crate::{ServiceConfig, ServiceState, StateSetupError};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
const LOG_FILE_NAME: &str = "capvault.log";

/// Initialize logging, panic handler, and build info reporting.
/// Returns guards that must be kept alive for the duration of the program.
pub fn init_logging(log_level: tracing::Level, log_dir: Option<&Path>) -> Vec<WorkerGuard> {
    use tracing_subscriber::fmt::format::FmtSpan;

    let mut guards = Vec::new();

    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(stdout_guard);

    let stdout_env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(stdout_env_filter);

    if let Some(log_dir) = log_dir {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
        }

        let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
        guards.push(file_guard);

        let file_env_filter = EnvFilter::builder()
            .with_default_directive(log_level.into())
            .from_env_lossy();

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(file_env_filter);

        tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(stdout_layer).init();
    }

    utils::register_panic_logger();
    utils::report_build_info();

    guards
}

/// Build state from config and serve until SIGINT/SIGTERM.
pub async fn spawn_service(config: &ServiceConfig) -> Result<(), ServiceError> {
    let log_level = config.log_level()?;
    let state = ServiceState::from_config(config)?;
    let (graceful_waiter, shutdown_rx) = utils::graceful_shutdown_blocker()?;

    let listen_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.listen_port);
    let http_config = http::Config::new(listen_addr, log_level);
    let mut server = tokio::spawn(http::run(http_config, state, shutdown_rx));

    tokio::select! {
        _ = graceful_waiter => {}
        // the server only finishes on its own after a bind or accept failure
        joined = &mut server => return flatten(joined),
    }

    match timeout(FINAL_SHUTDOWN_TIMEOUT, server).await {
        Ok(joined) => flatten(joined),
        Err(_) => {
            tracing::error!(
                "Failed to shut down within {} seconds",
                FINAL_SHUTDOWN_TIMEOUT.as_secs()
            );
            Err(ServiceError::ShutdownTimeout)
        }
    }
}

fn flatten(
    joined: Result<Result<(), http::HttpServerError>, tokio::task::JoinError>,
) -> Result<(), ServiceError> {
    match joined {
        Ok(result) => result.map_err(ServiceError::from),
        Err(e) => Err(ServiceError::Task(e.to_string())),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("config error: {0}")]
    Config(#[from] crate::ConfigError),
    #[error("state setup error: {0}")]
    State(#[from] StateSetupError),
    #[error("failed to install signal handlers: {0}")]
    Signals(#[from] std::io::Error),
    #[error("http server error: {0}")]
    Http(#[from] http::HttpServerError),
    #[error("server task failed: {0}")]
    Task(String),
    #[error("failed to shut down within the grace period")]
    ShutdownTimeout,
}
