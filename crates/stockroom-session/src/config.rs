//! Session tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default bound on a single refresh call.
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 30;

/// Floor applied to the refresh bound.
pub const MIN_REFRESH_TIMEOUT_SECS: u64 = 1;

/// Where unauthenticated navigation is sent.
pub const DEFAULT_LOGIN_ROUTE: &str = "/auth/login";

/// Configuration for [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Upper bound on one refresh call, in seconds. When it elapses, every
    /// coalesced waiter fails and the session is cleared.
    pub refresh_timeout_secs: u64,
    /// Entry point the host navigates to when the session is gone.
    pub login_route: String,
}

impl SessionConfig {
    /// The refresh bound as a `Duration`, never shorter than one second.
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs.max(MIN_REFRESH_TIMEOUT_SECS))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_timeout_secs: DEFAULT_REFRESH_TIMEOUT_SECS,
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
        }
    }
}
