//! Session token lifecycle for the Stockroom admin client.
//!
//! Provides:
//! - [`TokenStore`]: Persistence for the access token, refresh token and tenant id
//! - [`decode_expiry`] / [`is_expired`]: Reading the `exp` claim of a bearer token
//! - [`TokenRefresher`]: Trait for the refresh exchange, with [`HttpTokenRefresher`]
//! - [`SessionManager`]: Auth-state queries and single-flight refresh
//! - [`RouteGuard`]: Navigation gate for protected routes
//! - [`SessionError`]: Session-specific error types

mod clock;
mod config;
mod error;
mod guard;
mod manager;
mod refresher;
mod single_flight;
mod store;
mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    DEFAULT_LOGIN_ROUTE, DEFAULT_REFRESH_TIMEOUT_SECS, MIN_REFRESH_TIMEOUT_SECS, SessionConfig,
};
pub use error::{Result, SessionError};
pub use guard::{GuardDecision, RouteGuard};
pub use manager::{SessionManager, SessionManagerBuilder};
pub use refresher::{HttpTokenRefresher, REFRESH_PATH, RefreshedTokens, TokenRefresher};
pub use single_flight::{RefreshCoordinator, RefreshState};
pub use store::{FileTokenStore, MemoryTokenStore, TokenKind, TokenStore};
pub use token::{decode_expiry, is_expired};

/// Join an API base URL and an endpoint path with exactly one slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
