//! The session owner.
//!
//! [`SessionManager`] answers auth-state questions, persists sessions
//! established by login, and runs the refresh exchange through a
//! [`RefreshCoordinator`] so that concurrent callers share one network
//! call.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::refresher::TokenRefresher;
use crate::single_flight::{RefreshCoordinator, RefreshState};
use crate::store::{TokenKind, TokenStore};
use crate::token;

/// Owns the stored session and its refresh lifecycle.
///
/// Cheap to clone (Arc internals); clones share the store and the
/// in-flight refresh cycle.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    clock: Arc<dyn Clock>,
    coordinator: RefreshCoordinator,
    config: SessionConfig,
}

/// Builder for [`SessionManager`].
pub struct SessionManagerBuilder {
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionManagerBuilder {
    /// Override the session configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the time source used for expiry checks.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Finish building.
    pub fn build(self) -> SessionManager {
        SessionManager {
            inner: Arc::new(SessionInner {
                store: self.store,
                refresher: self.refresher,
                clock: self.clock,
                coordinator: RefreshCoordinator::new(),
                config: self.config,
            }),
        }
    }
}

impl SessionManager {
    /// Start building a manager over `store`, refreshing through `refresher`.
    pub fn builder(
        store: Arc<dyn TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> SessionManagerBuilder {
        SessionManagerBuilder {
            store,
            refresher,
            clock: Arc::new(SystemClock),
            config: SessionConfig::default(),
        }
    }

    /// A manager with the system clock and default configuration.
    pub fn new(store: Arc<dyn TokenStore>, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self::builder(store, refresher).build()
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Current time according to the manager's clock.
    pub fn now(&self) -> i64 {
        self.inner.clock.now()
    }

    /// Whether `token` is expired (or undecodable) right now.
    pub fn is_expired(&self, token: &str) -> bool {
        token::is_expired(token, self.now())
    }

    /// The stored access token, expired or not.
    pub fn access_token(&self) -> Option<String> {
        self.inner.read(TokenKind::Access)
    }

    /// The stored access token, only if it has not expired.
    pub fn valid_access_token(&self) -> Option<String> {
        self.access_token().filter(|t| !self.is_expired(t))
    }

    /// The stored refresh token.
    pub fn refresh_token(&self) -> Option<String> {
        self.inner.read(TokenKind::Refresh)
    }

    /// The stored tenant id.
    pub fn tenant_id(&self) -> Option<String> {
        self.inner.read(TokenKind::Tenant)
    }

    /// True when the access token is usable, or when it is expired or
    /// absent but an unexpired refresh token can mint a new one.
    pub fn is_authenticated(&self) -> bool {
        if self.valid_access_token().is_some() {
            return true;
        }
        self.refresh_token().is_some_and(|t| !self.is_expired(&t))
    }

    /// Persist a session established by login or email verification.
    pub fn set_auth(&self, access: &str, refresh: &str, tenant: &str) -> Result<()> {
        self.inner.store.set(access, refresh, tenant)?;
        log::info!("Session established for tenant '{tenant}'");
        Ok(())
    }

    /// Drop the stored session.
    pub fn clear_auth(&self) -> Result<()> {
        self.inner.store.clear()?;
        log::info!("Session cleared");
        Ok(())
    }

    /// Mint a new access token from the stored refresh token.
    ///
    /// Joins the refresh already in flight when there is one, so concurrent
    /// callers cause exactly one network call and all see its outcome. Any
    /// failure clears the stored session before it is returned.
    pub async fn refresh_access_token(&self) -> Result<String> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .coordinator
            .run(move || async move { inner.perform_refresh().await })
            .await
    }

    /// State of the refresh cycle.
    pub fn state(&self) -> RefreshState {
        self.inner.coordinator.state()
    }

    /// Subscribe to refresh-cycle state changes.
    pub fn subscribe(&self) -> watch::Receiver<RefreshState> {
        self.inner.coordinator.subscribe()
    }

    /// Number of refresh cycles started (each is one network call at most).
    pub fn refresh_cycles(&self) -> u64 {
        self.inner.coordinator.cycles()
    }
}

impl SessionInner {
    fn read(&self, kind: TokenKind) -> Option<String> {
        match self.store.get(kind) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(err) => {
                log::warn!("Could not read {kind} from the token store: {err}");
                None
            }
        }
    }

    async fn perform_refresh(&self) -> Result<String> {
        let outcome = self.exchange_refresh_token().await;
        if let Err(err) = &outcome {
            log::warn!("Token refresh failed, clearing session: {err}");
            if let Err(clear_err) = self.store.clear() {
                log::error!("Failed to clear session after refresh failure: {clear_err}");
            }
        }
        outcome
    }

    async fn exchange_refresh_token(&self) -> Result<String> {
        let refresh = self
            .read(TokenKind::Refresh)
            .ok_or(SessionError::NoRefreshToken)?;

        if token::is_expired(&refresh, self.clock.now()) {
            return Err(SessionError::RefreshExpired);
        }

        let bound = self.config.refresh_timeout();
        let tokens = tokio::time::timeout(bound, self.refresher.refresh(&refresh))
            .await
            .map_err(|_| SessionError::RefreshTimeout {
                seconds: bound.as_secs(),
            })??;

        self.store.set_token(TokenKind::Access, &tokens.access)?;
        if let Some(rotated) = &tokens.refresh {
            self.store.set_token(TokenKind::Refresh, rotated)?;
        }

        log::info!(
            "Access token refreshed{}",
            if tokens.refresh.is_some() {
                " (refresh token rotated)"
            } else {
                ""
            }
        );
        Ok(tokens.access)
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.inner.config)
            .field("refresh", &self.inner.coordinator)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
