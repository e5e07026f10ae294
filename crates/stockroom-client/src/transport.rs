//! reqwest-backed inner service.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Request, Response};
use tower::Service;

use crate::body::ApiBody;
use crate::error::{ClientError, Result};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends `http::Request<ApiBody>` over a shared `reqwest::Client`.
///
/// Multipart bodies get their boundary `Content-Type` here; every other
/// header is sent as the pipeline left it.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Transport with a fresh client and the default timeout.
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new(), DEFAULT_REQUEST_TIMEOUT)
    }

    /// Transport with a fresh client and a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), timeout)
    }

    /// Transport over an existing client.
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// The underlying client, for sharing with the token refresher.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<ApiBody>> for HttpTransport {
    type Response = Response<Bytes>;
    type Error = ClientError;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<ApiBody>) -> Self::Future {
        let client = self.client.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let url = parts.uri.to_string();
            let method = parts.method.clone();

            let mut headers = parts.headers;
            let payload = match body {
                ApiBody::Empty => None,
                ApiBody::Json(bytes) => Some(bytes),
                ApiBody::Multipart {
                    content_type,
                    bytes,
                } => {
                    let value = HeaderValue::from_str(&content_type).map_err(|e| {
                        ClientError::invalid_request(format!("multipart content type: {e}"))
                    })?;
                    headers.insert(CONTENT_TYPE, value);
                    Some(bytes)
                }
            };

            let mut builder = client
                .request(parts.method, &url)
                .headers(headers)
                .timeout(timeout);
            if let Some(bytes) = payload {
                builder = builder.body(bytes);
            }

            log::debug!("{method} {url}");
            let upstream = builder
                .send()
                .await
                .map_err(|e| ClientError::transport(format!("{method} {url} failed: {e}")))?;

            let status = upstream.status();
            let headers = upstream.headers().clone();
            let bytes = upstream
                .bytes()
                .await
                .map_err(|e| ClientError::transport(format!("reading {url} response: {e}")))?;

            log::debug!("{method} {url} -> {status}");
            let mut response = Response::new(bytes);
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            Ok(response)
        })
    }
}
