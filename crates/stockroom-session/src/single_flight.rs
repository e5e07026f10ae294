//! Single-flight coordination of refresh cycles.
//!
//! A [`RefreshCoordinator`] guarantees that at most one refresh is running
//! at a time. The first caller of [`RefreshCoordinator::run`] starts a
//! cycle; everyone who arrives while it is pending joins it and receives
//! the same outcome. The refresh itself runs on a spawned task, so a cycle
//! always completes and publishes its result even if every caller that was
//! waiting on it has been dropped.
//!
//! ```text
//! Idle ──run()──▶ Refreshing ──▶ Succeeded ──run()──▶ Refreshing ...
//!                           └──▶ Failed    ──run()──▶ Refreshing ...
//! ```

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::error::{Result, SessionError};

// ============================================================================
// RefreshState
// ============================================================================

/// Where the coordinator is in its refresh cycle.
///
/// `Succeeded` and `Failed` are resting states that remember how the last
/// cycle ended; a new cycle may start from any state except `Refreshing`.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshState {
    /// No cycle has run yet.
    Idle,
    /// A refresh call is outstanding.
    Refreshing,
    /// The last cycle minted a new access token.
    Succeeded,
    /// The last cycle failed and the session was cleared.
    Failed(SessionError),
}

impl RefreshState {
    /// Returns `true` while a refresh call is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Refreshing)
    }
}

impl fmt::Display for RefreshState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Refreshing => write!(f, "refreshing"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

// ============================================================================
// RefreshCoordinator
// ============================================================================

type Outcome = Option<Result<String>>;

/// Coalesces concurrent refresh requests onto one in-flight cycle.
///
/// Cheap to clone (Arc internals). Clones share the same cycle.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    pending: Mutex<Option<watch::Receiver<Outcome>>>,
    state: watch::Sender<RefreshState>,
    cycles: AtomicU64,
}

impl CoordinatorInner {
    fn finish(&self, tx: &watch::Sender<Outcome>, outcome: Result<String>) {
        let state = match &outcome {
            Ok(_) => RefreshState::Succeeded,
            Err(err) => RefreshState::Failed(err.clone()),
        };

        {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            tx.send_replace(Some(outcome));
            *pending = None;
        }

        log::debug!("Refresh cycle finished: {state}");
        self.state.send_replace(state);
    }
}

impl RefreshCoordinator {
    /// Create a coordinator with no cycle in flight.
    pub fn new() -> Self {
        let (state, _rx) = watch::channel(RefreshState::Idle);
        Self {
            inner: Arc::new(CoordinatorInner {
                pending: Mutex::new(None),
                state,
                cycles: AtomicU64::new(0),
            }),
        }
    }

    /// Current state.
    pub fn state(&self) -> RefreshState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<RefreshState> {
        self.inner.state.subscribe()
    }

    /// Number of cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.inner.cycles.load(Ordering::SeqCst)
    }

    /// Join the cycle in flight, or start one by spawning `start()`.
    ///
    /// `start` is only invoked when this call opens a new cycle.
    pub async fn run<F, Fut>(&self, start: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let mut rx = {
            let mut pending = self
                .inner
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            // A receiver whose sender is gone without publishing belongs to a
            // cycle whose task died; it must not swallow new callers.
            let live = pending
                .as_ref()
                .filter(|rx| rx.has_changed().is_ok() || rx.borrow().is_some())
                .cloned();

            match live {
                Some(rx) => {
                    log::debug!("Refresh already in flight, joining it");
                    rx
                }
                None => {
                    let (tx, rx) = watch::channel(None);
                    *pending = Some(rx.clone());
                    let cycle = self.inner.cycles.fetch_add(1, Ordering::SeqCst) + 1;
                    log::debug!("Starting refresh cycle {cycle}");
                    self.inner.state.send_replace(RefreshState::Refreshing);

                    let inner = Arc::clone(&self.inner);
                    let refresh = start();
                    tokio::spawn(async move {
                        let outcome = refresh.await;
                        inner.finish(&tx, outcome);
                    });
                    rx
                }
            }
        };

        wait_for_outcome(&mut rx).await
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("state", &self.state())
            .field("cycles", &self.cycles())
            .finish()
    }
}

async fn wait_for_outcome(rx: &mut watch::Receiver<Outcome>) -> Result<String> {
    loop {
        if let Some(outcome) = rx.borrow_and_update().clone() {
            return outcome;
        }
        if rx.changed().await.is_err() {
            return rx.borrow().clone().unwrap_or_else(|| {
                Err(SessionError::transport(
                    "refresh task ended without a result",
                ))
            });
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
