use clap::Parser;
use tracing_subscriber::EnvFilter;

use packsync::cli::{self, Cli, Command};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,packsync=debug")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Sync(opts) => cli::run_sync(opts).await,
        Command::Check(opts) => cli::run_check(opts).await,
        Command::Status(opts) => cli::run_status(opts).await,
    };

    if let Err(err) = result {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}
