use std::future::Future;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Spawns a task that waits for SIGINT or SIGTERM and then flips the returned
///  watch. Either signal stops accepting new requests at once; downloads
///  already streaming are bounded by the caller's final shutdown timeout.
pub fn graceful_shutdown_blocker() -> std::io::Result<(JoinHandle<()>, watch::Receiver<()>)> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let (tx, rx) = watch::channel(());
    let first_signal = async move {
        tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        }
    };

    Ok((tokio::spawn(forward_shutdown(first_signal, tx)), rx))
}

async fn forward_shutdown(signal: impl Future<Output = &'static str>, tx: watch::Sender<()>) {
    let name = signal.await;
    tracing::info!(signal = name, "shutdown requested, draining in-flight requests");
    let _ = tx.send(());
}

/// Registers a panic hook that logs panics using the `tracing` crate
pub fn register_panic_logger() {
    std::panic::set_hook(Box::new(|panic| match panic.location() {
        Some(loc) => {
            tracing::error!(
                message = %panic,
                panic.file = loc.file(),
                panic.line = loc.line(),
                panic.column = loc.column(),
            );
        }
        None => tracing::error!(message = %panic),
    }));
}

pub fn report_build_info() {
    let build = common::version::build_info();

    tracing::info!(
        version = build.version,
        build_profile = build.build_profile,
        built_at = build.build_timestamp,
        rustc = build.rust_version,
        target = build.target,
        "capvault gateway starting up"
    );
}
