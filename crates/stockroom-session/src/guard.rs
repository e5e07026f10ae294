//! Navigation gate for protected routes.

use crate::manager::SessionManager;

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Proceed to the requested route.
    Allow,
    /// Navigate to `to` instead.
    Redirect {
        /// Route to navigate to.
        to: String,
    },
}

impl GuardDecision {
    /// Returns `true` for [`GuardDecision::Allow`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decides whether navigation to a protected route may proceed.
///
/// An expired access token is not a dead end: when the refresh token is
/// still good the guard refreshes first, joining any refresh already in
/// flight, and only then decides.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: SessionManager,
}

impl RouteGuard {
    /// Create a guard over `session`.
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    /// Check navigation to `route`.
    pub async fn check(&self, route: &str) -> GuardDecision {
        let access = self.session.access_token();
        let refresh = self.session.refresh_token();

        if access.is_none() && refresh.is_none() {
            log::debug!("No session, redirecting {route} to login");
            return self.to_login();
        }

        if access.as_deref().is_some_and(|t| !self.session.is_expired(t)) {
            return GuardDecision::Allow;
        }

        if refresh.as_deref().is_some_and(|t| !self.session.is_expired(t)) {
            log::debug!("Access token expired, refreshing before {route}");
            return match self.session.refresh_access_token().await {
                Ok(_) => GuardDecision::Allow,
                Err(err) => {
                    log::info!("Refresh failed while guarding {route}: {err}");
                    self.to_login()
                }
            };
        }

        log::info!("Session expired, redirecting {route} to login");
        if let Err(err) = self.session.clear_auth() {
            log::error!("Failed to clear expired session: {err}");
        }
        self.to_login()
    }

    fn to_login(&self) -> GuardDecision {
        GuardDecision::Redirect {
            to: self.session.config().login_route.clone(),
        }
    }
}
