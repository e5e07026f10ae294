//! Credential attachment and the 401 refresh-and-retry path over HTTP.

use std::time::Duration;

use http::{Method, StatusCode};
use serde_json::json;
use stockroom_client::{ApiBody, ClientError};
use stockroom_session::{SessionError, TokenKind, TokenStore};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{Harness, NOW, mint, no_authorization, user_json};

#[tokio::test]
async fn test_protected_request_carries_bearer_and_tenant() {
    let harness = Harness::start().await;
    let (access, _) = harness.sign_in(NOW + 300);

    Mock::given(method("GET"))
        .and(path("/api/auth/user/"))
        .and(header("authorization", format!("Bearer {access}").as_str()))
        .and(header("x-tenant-id", "acme"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&harness.server)
        .await;

    let user = harness.client.current_user().await.unwrap();
    assert_eq!(user.username, "ops");
}

#[tokio::test]
async fn test_expired_access_refreshes_and_retries() {
    let harness = Harness::start().await;
    harness.sign_in(NOW - 30);
    let fresh = mint("access", NOW + 300);

    Mock::given(method("GET"))
        .and(path("/api/products/"))
        .and(no_authorization)
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Authentication credentials were not provided."
        })))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": fresh })))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products/"))
        .and(header("authorization", format!("Bearer {fresh}").as_str()))
        .and(header("x-tenant-id", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&harness.server)
        .await;

    let products: serde_json::Value = harness.client.get_json("/products/").await.unwrap();

    assert_eq!(products, json!([{ "id": 1 }]));
    assert_eq!(harness.store.get(TokenKind::Access).unwrap(), Some(fresh));
}

#[tokio::test]
async fn test_failed_refresh_requires_login_and_clears() {
    let harness = Harness::start().await;
    harness.sign_in(NOW + 300);

    Mock::given(method("DELETE"))
        .and(path("/api/products/9/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Token is blacklisted" })),
        )
        .expect(1)
        .mount(&harness.server)
        .await;

    let err = harness.client.delete("/products/9/").await.unwrap_err();

    assert!(matches!(
        &err,
        ClientError::LoginRequired { reason: SessionError::RefreshRejected { status: 401, message }, login_route }
            if message == "Token is blacklisted" && login_route == "/auth/login"
    ));
    assert!(err.requires_login());
    for kind in TokenKind::ALL {
        assert!(harness.store.get(kind).unwrap().is_none());
    }
}

#[tokio::test]
async fn test_retry_401_is_final() {
    let harness = Harness::start().await;
    harness.sign_in(NOW + 300);

    Mock::given(method("GET"))
        .and(path("/api/orders/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "access": mint("access", NOW + 600) })),
        )
        .expect(1)
        .mount(&harness.server)
        .await;

    let response = harness
        .client
        .send(Method::GET, "/orders/", ApiBody::Empty)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let harness = Harness::start().await;
    harness.sign_in(NOW - 30);
    let fresh = mint("access", NOW + 300);

    Mock::given(method("GET"))
        .and(no_authorization)
        .respond_with(ResponseTemplate::new(401))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": fresh }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", format!("Bearer {fresh}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(5)
        .mount(&harness.server)
        .await;

    let calls = (0..5).map(|i| {
        let client = harness.client.clone();
        async move {
            client
                .get_json::<serde_json::Value>(&format!("/alerts/{i}/"))
                .await
        }
    });
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(|r| r.as_ref().unwrap()["ok"] == true));
    assert_eq!(harness.client.session().refresh_cycles(), 1);
}

#[tokio::test]
async fn test_non_401_errors_pass_through() {
    let harness = Harness::start().await;
    harness.sign_in(NOW + 300);

    Mock::given(method("GET"))
        .and(path("/api/inventory/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "detail": "Forbidden" })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let err = harness
        .client
        .get_json::<serde_json::Value>("/inventory/")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    assert_eq!(harness.client.session().refresh_cycles(), 0);
}

#[tokio::test]
async fn test_multipart_upload_keeps_boundary_content_type() {
    let harness = Harness::start().await;
    harness.sign_in(NOW + 300);

    Mock::given(method("POST"))
        .and(path("/api/products/import/"))
        .and(header("content-type", "multipart/form-data; boundary=stock"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "imported": 3 })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let body = ApiBody::multipart(
        "multipart/form-data; boundary=stock",
        b"--stock\r\nContent-Disposition: form-data; name=\"file\"\r\n\r\nsku\r\n--stock--\r\n".to_vec(),
    );
    let response = harness
        .client
        .send(Method::POST, "/products/import/", body)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}
