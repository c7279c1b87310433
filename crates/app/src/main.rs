// CLI modules
mod cli;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Build, Resolve, Version, View};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

command_enum! {
    (Build, Build),
    (View, View),
    (Resolve, Resolve),
    (Version, Version),
}

/// Everything usage-related exits 2, the same code clap uses for bad flags.
const EXIT_FAILURE: i32 = 2;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // stdout carries command output, so logs go to stderr
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter = EnvFilter::builder()
        .with_default_directive(args.log_level.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(false)
                .with_filter(filter),
        )
        .init();

    let ctx = cli::op::OpContext::new(args.acl);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    };

    // flush buffered log lines before exiting
    drop(guard);
    std::process::exit(code);
}
