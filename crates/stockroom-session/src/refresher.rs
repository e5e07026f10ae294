//! Refresh-token exchange against the auth backend.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::join_url;

/// Path of the token refresh endpoint, relative to the API base URL.
pub const REFRESH_PATH: &str = "/auth/token/refresh/";

/// Tokens minted by a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    /// The new access token.
    pub access: String,
    /// A rotated refresh token, when the backend issues one.
    pub refresh: Option<String>,
}

/// Exchanges a refresh token for a new access token.
///
/// Implementations make exactly one network call per invocation; the
/// session manager is responsible for coalescing concurrent callers.
#[async_trait]
pub trait TokenRefresher: Send + Sync + 'static {
    /// Perform the exchange.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens>;
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// [`TokenRefresher`] that calls `POST {base}/auth/token/refresh/`.
///
/// Talks to the endpoint directly rather than through the request
/// pipeline, so a failing refresh can never trigger another refresh.
#[derive(Debug, Clone)]
pub struct HttpTokenRefresher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTokenRefresher {
    /// Create a refresher for the API rooted at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a refresher that shares an existing HTTP client.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: join_url(base_url, REFRESH_PATH),
        }
    }

    /// Full URL of the refresh endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens> {
        log::debug!("Requesting access token refresh from {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await
            .map_err(|e| SessionError::transport(format!("refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.detail)
                .unwrap_or(body);
            return Err(SessionError::RefreshRejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| SessionError::transport(format!("refresh response parse failed: {e}")))?;

        Ok(RefreshedTokens {
            access: body.access,
            refresh: body.refresh,
        })
    }
}
