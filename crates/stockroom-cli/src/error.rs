//! Error types for stockroom-cli

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for stockroom-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stockroom-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Configuration could not be located, parsed or applied.
    #[error("Config error: {0}")]
    Config(String),

    /// Filesystem error on a known path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the API client.
    #[error("Client error: {0}")]
    Client(#[from] stockroom_client::ClientError),

    /// Error from the session layer.
    #[error("Session error: {0}")]
    Session(#[from] stockroom_session::SessionError),
}

impl Error {
    /// Creates a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Creates an I/O error tagged with the path it happened on.
    pub fn io_with_path(source: std::io::Error, path: &Path) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the user has to sign in again.
    pub fn requires_login(&self) -> bool {
        match self {
            Error::Client(err) => err.requires_login(),
            Error::Session(err) => err.requires_login(),
            _ => false,
        }
    }
}
