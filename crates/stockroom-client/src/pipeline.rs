//! Tower session middleware.
//!
//! `SessionLayer` and `SessionService` sit between the caller and the
//! transport. They classify each request as public or protected, attach
//! credentials to protected requests, and turn a 401 into one coalesced
//! token refresh followed by exactly one retry.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};
use http::{Request, Response, StatusCode};
use stockroom_session::SessionManager;
use tower::{Layer, Service, ServiceExt};

use crate::body::ApiBody;
use crate::endpoints::EndpointPolicy;
use crate::error::{ClientError, Result};

/// Header carrying the tenant partition of a protected request.
pub const TENANT_HEADER: HeaderName = HeaderName::from_static("x-tenant-id");

/// Tower `Layer` that wraps a transport with session handling.
#[derive(Clone, Debug)]
pub struct SessionLayer {
    session: SessionManager,
    policy: EndpointPolicy,
}

impl SessionLayer {
    /// Create a layer over `session`, classifying URLs with `policy`.
    pub fn new(session: SessionManager, policy: EndpointPolicy) -> Self {
        Self { session, policy }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService {
            inner,
            session: self.session.clone(),
            policy: self.policy.clone(),
        }
    }
}

/// Tower `Service` that authenticates requests and recovers from 401s.
///
/// A 401 on a protected request triggers one refresh through the
/// [`SessionManager`]; concurrent 401s share that refresh. The request is
/// then replayed once with the new token and whatever the replay returns
/// is the final answer, another 401 included. When the refresh fails the
/// session is cleared and [`ClientError::LoginRequired`] is returned.
#[derive(Clone, Debug)]
pub struct SessionService<S> {
    inner: S,
    session: SessionManager,
    policy: EndpointPolicy,
}

impl<S> SessionService<S> {
    /// The session this service authenticates with.
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// The public/protected classification in use.
    pub fn policy(&self) -> &EndpointPolicy {
        &self.policy
    }
}

impl<S> Service<Request<ApiBody>> for SessionService<S>
where
    S: Service<Request<ApiBody>, Response = Response<Bytes>, Error = ClientError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = ClientError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ApiBody>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let session = self.session.clone();
        let policy = self.policy.clone();

        Box::pin(async move {
            let url = req.uri().to_string();

            if policy.is_public(&url) {
                let req = prepare(req, None, None)?;
                return inner.call(req).await;
            }

            let replay = replay_of(&req);
            let req = prepare(req, session.valid_access_token(), session.tenant_id())?;
            let response = inner.call(req).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            log::info!("401 from {url}, refreshing access token");
            match session.refresh_access_token().await {
                Ok(token) => {
                    let token = Some(token).filter(|t| !session.is_expired(t));
                    let retry = prepare(replay, token, session.tenant_id())?;
                    log::debug!("Retrying {url} with refreshed token");
                    inner.ready().await?.call(retry).await
                }
                Err(reason) => {
                    // The session manager has already cleared the stored tokens.
                    log::warn!("Refresh after 401 failed, login required: {reason}");
                    Err(ClientError::LoginRequired {
                        reason,
                        login_route: session.config().login_route.clone(),
                    })
                }
            }
        })
    }
}

/// Rebuild `req` with the headers the pipeline owns.
///
/// `Accept` is always JSON. `Content-Type` is JSON unless the body is
/// multipart, whose boundary type is set by the transport. `Authorization`
/// and the tenant header are present only when a value is supplied.
fn prepare(
    mut req: Request<ApiBody>,
    bearer: Option<String>,
    tenant: Option<String>,
) -> Result<Request<ApiBody>> {
    let multipart = req.body().is_multipart();
    let headers = req.headers_mut();

    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if multipart {
        headers.remove(CONTENT_TYPE);
    } else {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    headers.remove(AUTHORIZATION);
    if let Some(token) = bearer {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ClientError::invalid_request(format!("bearer token: {e}")))?;
        headers.insert(AUTHORIZATION, value);
    }

    headers.remove(TENANT_HEADER);
    if let Some(tenant) = tenant.filter(|t| !t.is_empty()) {
        let value = HeaderValue::from_str(&tenant)
            .map_err(|e| ClientError::invalid_request(format!("tenant id: {e}")))?;
        headers.insert(TENANT_HEADER, value);
    }

    Ok(req)
}

/// Copy of `req` for the single retry. Extensions are not carried over.
fn replay_of(req: &Request<ApiBody>) -> Request<ApiBody> {
    let mut replay = Request::new(req.body().clone());
    *replay.method_mut() = req.method().clone();
    *replay.uri_mut() = req.uri().clone();
    *replay.version_mut() = req.version();
    *replay.headers_mut() = req.headers().clone();
    replay
}

// ============================================================================
// Tests
// ============================================================================
