//! Error types for stockroom-client.

use http::StatusCode;
use stockroom_session::SessionError;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised by the request pipeline and the API client.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClientError {
    /// A session operation failed outside of the refresh path.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The session is gone; the host must navigate to `login_route`.
    #[error("login required ({reason}); navigate to {login_route}")]
    LoginRequired {
        /// Why the session ended.
        reason: SessionError,
        /// Where the host should send the user.
        login_route: String,
    },

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Response status.
        status: StatusCode,
        /// Response body, as text.
        body: String,
    },

    /// The request could not be delivered or the response not read.
    #[error("transport error: {0}")]
    Transport(String),

    /// A body could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Creates a transport error from anything displayable.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        ClientError::Transport(err.to_string())
    }

    /// Creates an invalid-request error from anything displayable.
    pub fn invalid_request(err: impl std::fmt::Display) -> Self {
        ClientError::InvalidRequest(err.to_string())
    }

    /// Whether the host should navigate to the login route.
    pub fn requires_login(&self) -> bool {
        match self {
            ClientError::LoginRequired { .. } => true,
            ClientError::Session(err) => err.requires_login(),
            _ => false,
        }
    }

    /// HTTP status of a backend error, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
