//! `mingle-chat` binary.

use std::process::ExitCode;

use clap::Parser;
use mingle_cli::Args;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();
    match mingle_cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "mingle-chat failed");
            ExitCode::FAILURE
        },
    }
}
