//! Error types for stockroom-session.

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised while managing the session.
///
/// The type is `Clone` so that one refresh outcome can be handed to every
/// caller coalesced onto the same refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SessionError {
    /// A refresh was requested but no refresh token is stored.
    #[error("no refresh token is stored")]
    NoRefreshToken,

    /// The stored refresh token has itself expired.
    #[error("refresh token has expired")]
    RefreshExpired,

    /// The backend rejected the refresh call.
    #[error("refresh rejected (HTTP {status}): {message}")]
    RefreshRejected {
        /// HTTP status returned by the refresh endpoint.
        status: u16,
        /// Backend `detail` message, or the raw body when there is none.
        message: String,
    },

    /// The refresh call did not complete within the configured bound.
    #[error("refresh timed out after {seconds}s")]
    RefreshTimeout {
        /// The bound that elapsed.
        seconds: u64,
    },

    /// Network-level failure while talking to the auth endpoint.
    #[error("transport error: {0}")]
    Transport(String),

    /// The token store could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// A token could not be decoded.
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

impl SessionError {
    /// Creates a storage error from anything displayable.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        SessionError::Storage(err.to_string())
    }

    /// Creates a transport error from anything displayable.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        SessionError::Transport(err.to_string())
    }

    /// Whether this error ends the session and sends the user back to login.
    ///
    /// Every failed refresh cycle clears the stored session, so all of the
    /// refresh-path errors qualify. Storage and decode errors do not.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            SessionError::NoRefreshToken
                | SessionError::RefreshExpired
                | SessionError::RefreshRejected { .. }
                | SessionError::RefreshTimeout { .. }
                | SessionError::Transport(_)
        )
    }
}
