//! Shared helpers for the session integration tests.

use std::sync::Arc;

use jsonwebtoken::{EncodingKey, Header};
use serde::Serialize;
use stockroom_session::{
    HttpTokenRefresher, ManualClock, MemoryTokenStore, SessionManager, TokenStore,
};
use wiremock::MockServer;

/// Fixed "now" for every test clock.
pub const NOW: i64 = 1_750_000_000;

#[derive(Serialize)]
struct Claims {
    token_type: &'static str,
    exp: i64,
    jti: String,
    user_id: u64,
}

/// Mint an HS256 token of `kind` expiring at `exp`.
pub fn mint(kind: &'static str, exp: i64) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        &Claims {
            token_type: kind,
            exp,
            jti: format!("{kind}-{exp}"),
            user_id: 42,
        },
        &EncodingKey::from_secret(b"integration-secret"),
    )
    .expect("token encodes")
}

/// Session wired to a mock backend.
pub struct Harness {
    pub server: MockServer,
    pub store: Arc<MemoryTokenStore>,
    pub session: SessionManager,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    /// Start a mock backend and a session whose API lives under `/api`.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryTokenStore::new());
        let clock = Arc::new(ManualClock::new(NOW));
        let refresher = HttpTokenRefresher::new(&format!("{}/api", server.uri()));
        let session = SessionManager::builder(
            Arc::clone(&store) as Arc<dyn TokenStore>,
            Arc::new(refresher),
        )
        .clock(Arc::clone(&clock) as Arc<dyn stockroom_session::Clock>)
        .build();
        Self {
            server,
            store,
            session,
            clock,
        }
    }
}
