//! # stockroom-cli
//!
//! Command-line host for the Stockroom admin client. Signs in, keeps the
//! session in a file between invocations, and issues authenticated API
//! requests through the session pipeline.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_handlers;
pub mod error;
pub mod logging;

pub use error::{Error, Result};

use cli::Args;
use commands::App;
use config::StockroomConfig;

/// Execute parsed arguments against an already loaded configuration and
/// return what to print.
pub async fn run(args: Args, config: StockroomConfig) -> Result<String> {
    let app = App::from_config(config, args.config);
    app.execute(args.command).await
}
