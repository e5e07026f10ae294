//! Command-line definition.

use clap::{Parser, Subcommand};

/// Stockroom admin client
#[derive(Parser, Debug)]
#[command(name = "stockroom")]
#[command(author, version, about = "Stockroom admin API client", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session
    Login {
        /// Account email
        email: String,
        /// Account password
        #[arg(long, env = "STOCKROOM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Show the stored session without touching the network
    Status,
    /// Exchange the refresh token for a new access token
    Refresh,
    /// Check whether navigation to a protected route would be allowed
    Guard {
        /// Route to check
        #[arg(default_value = "/")]
        route: String,
    },
    /// GET an API path and print the JSON response
    Get {
        /// Path relative to the API base URL, e.g. /products/
        path: String,
    },
    /// Show the signed-in account
    Whoami,
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "STOCKROOM_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        phone_number: String,
    },
    /// Confirm an email address with the token from the verification email
    VerifyEmail {
        /// Verification token
        token: String,
    },
    /// Password reset
    PasswordReset {
        #[command(subcommand)]
        action: PasswordResetAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum PasswordResetAction {
    /// Send a reset email
    Request {
        /// Account email
        email: String,
    },
    /// Set a new password
    Confirm {
        /// Token from the reset email
        token: String,
        /// New password
        #[arg(long, env = "STOCKROOM_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the effective configuration
    Show,
    /// Print one value by dotted key
    Get {
        /// Dotted key, e.g. session.login_route
        key: String,
    },
    /// Write a default config file
    Init {
        /// Target file (defaults to the standard location)
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
