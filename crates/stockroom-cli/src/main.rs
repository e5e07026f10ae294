//! Stockroom CLI
//!
//! Command-line interface for the Stockroom admin API.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use stockroom_cli::cli::Args;
use stockroom_cli::config::StockroomConfig;
use stockroom_cli::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = StockroomConfig::load_with_env(args.config.as_deref())
        .context("loading configuration")?;
    logging::init(&config.logging.level, args.verbose);

    match stockroom_cli::run(args, config).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            Ok(())
        }
        Err(err) if err.requires_login() => {
            tracing::warn!("Session ended: {err}");
            Err(err).context("not signed in; run `stockroom login <email>`")
        }
        Err(err) => Err(err.into()),
    }
}
