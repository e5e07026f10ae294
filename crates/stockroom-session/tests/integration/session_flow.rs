//! Session manager and route guard over a real HTTP refresher.

use std::time::Duration;

use serde_json::json;
use stockroom_session::{
    GuardDecision, RefreshState, RouteGuard, SessionError, TokenKind, TokenStore,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{Harness, NOW, mint};

const REFRESH_PATH: &str = "/api/auth/token/refresh/";

#[tokio::test]
async fn test_concurrent_refreshes_hit_backend_once() {
    let harness = Harness::start().await;
    let fresh = mint("access", NOW + 300);
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": fresh }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&harness.server)
        .await;
    harness
        .session
        .set_auth(&mint("access", NOW - 5), &mint("refresh", NOW + 3600), "acme")
        .unwrap();

    let callers = (0..8).map(|_| {
        let session = harness.session.clone();
        tokio::spawn(async move { session.refresh_access_token().await })
    });
    let results = futures::future::join_all(callers).await;

    for result in results {
        assert_eq!(result.unwrap().unwrap(), fresh);
    }
    assert_eq!(harness.session.refresh_cycles(), 1);
    assert_eq!(harness.store.get(TokenKind::Access).unwrap(), Some(fresh));
    assert_eq!(harness.session.tenant_id().as_deref(), Some("acme"));
}

#[tokio::test]
async fn test_rejected_refresh_clears_session_for_all_waiters() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Token is invalid or expired" }))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&harness.server)
        .await;
    harness
        .session
        .set_auth(&mint("access", NOW - 5), &mint("refresh", NOW + 3600), "acme")
        .unwrap();

    let (a, b) = tokio::join!(
        harness.session.refresh_access_token(),
        harness.session.refresh_access_token()
    );

    let expected = SessionError::RefreshRejected {
        status: 401,
        message: "Token is invalid or expired".to_string(),
    };
    assert_eq!(a.unwrap_err(), expected);
    assert_eq!(b.unwrap_err(), expected);
    assert!(!harness.session.is_authenticated());
    assert!(harness.session.tenant_id().is_none());
    assert_eq!(harness.session.state(), RefreshState::Failed(expected));
}

#[tokio::test]
async fn test_expired_refresh_token_never_reaches_backend() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "x" })))
        .expect(0)
        .mount(&harness.server)
        .await;
    harness
        .session
        .set_auth(&mint("access", NOW - 5), &mint("refresh", NOW - 1), "acme")
        .unwrap();

    let err = harness.session.refresh_access_token().await.unwrap_err();
    assert_eq!(err, SessionError::RefreshExpired);
}

#[tokio::test]
async fn test_guard_refreshes_once_clock_passes_access_expiry() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "access": mint("access", NOW + 900) })),
        )
        .expect(1)
        .mount(&harness.server)
        .await;
    harness
        .session
        .set_auth(&mint("access", NOW + 60), &mint("refresh", NOW + 3600), "acme")
        .unwrap();
    let guard = RouteGuard::new(harness.session.clone());

    assert_eq!(guard.check("/dashboard").await, GuardDecision::Allow);
    assert_eq!(harness.session.refresh_cycles(), 0);

    harness.clock.advance(120);
    assert_eq!(guard.check("/dashboard").await, GuardDecision::Allow);
    assert_eq!(harness.session.refresh_cycles(), 1);
    assert!(harness.session.valid_access_token().is_some());
}

#[tokio::test]
async fn test_guard_redirects_when_backend_rejects() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "nope" })))
        .mount(&harness.server)
        .await;
    harness
        .session
        .set_auth(&mint("access", NOW - 5), &mint("refresh", NOW + 3600), "acme")
        .unwrap();

    let decision = RouteGuard::new(harness.session.clone())
        .check("/orders")
        .await;

    assert_eq!(
        decision,
        GuardDecision::Redirect {
            to: "/auth/login".to_string()
        }
    );
    assert!(harness.session.refresh_token().is_none());
}
