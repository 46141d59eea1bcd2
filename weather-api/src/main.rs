//! Binary crate for the `weather` command.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and layering configuration
//! - Serving weather-by-day queries over HTTP
//! - Interactive configuration and human-friendly terminal output

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
