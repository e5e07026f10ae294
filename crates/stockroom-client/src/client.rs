//! High-level API client.

use bytes::Bytes;
use http::{Method, Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use stockroom_session::{SessionManager, join_url};
use tower::{Layer, Service, ServiceExt};

use crate::body::ApiBody;
use crate::endpoints::{self, EndpointPolicy};
use crate::error::{ClientError, Result};
use crate::models::{
    DetailResponse, EmailBody, LoginRequest, LoginResponse, RefreshBody, RegisterRequest,
    RegisterResponse, ResetConfirmBody, User, VerifyEmailResponse,
};
use crate::pipeline::{SessionLayer, SessionService};
use crate::transport::HttpTransport;

/// Client for the admin REST API.
///
/// Every request, public or protected, goes through the session pipeline.
/// Generic over the pipeline service so tests can swap the transport.
#[derive(Debug, Clone)]
pub struct AdminClient<S = SessionService<HttpTransport>> {
    service: S,
    session: SessionManager,
    base_url: String,
}

impl AdminClient<SessionService<HttpTransport>> {
    /// Client over HTTP for the API rooted at `base_url`.
    pub fn connect(
        base_url: &str,
        session: SessionManager,
        policy: EndpointPolicy,
        transport: HttpTransport,
    ) -> Self {
        let service = SessionLayer::new(session.clone(), policy).layer(transport);
        Self::with_service(base_url, session, service)
    }
}

impl<S> AdminClient<S>
where
    S: Service<Request<ApiBody>, Response = Response<Bytes>, Error = ClientError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    /// Client over an already assembled pipeline.
    pub fn with_service(base_url: &str, session: SessionManager, service: S) -> Self {
        Self {
            service,
            session,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The session this client authenticates with.
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// API base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of `path`.
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Send a request to `path` and return the raw response, whatever its status.
    pub async fn send(&self, method: Method, path: &str, body: ApiBody) -> Result<Response<Bytes>> {
        self.dispatch(method, &self.url(path), body).await
    }

    /// `GET path`, decoding a JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        decode(self.send(Method::GET, path, ApiBody::Empty).await?)
    }

    /// `GET path?params`, decoding a JSON response.
    ///
    /// Parameters are percent-encoded in order; an empty slice sends no query.
    pub async fn get_json_query<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = self.url_with_query(path, params)?;
        decode(self.dispatch(Method::GET, &url, ApiBody::Empty).await?)
    }

    /// `POST path` with a JSON body, decoding a JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        decode(self.send(Method::POST, path, ApiBody::json(body)?).await?)
    }

    /// `PUT path` with a JSON body, decoding a JSON response.
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        decode(self.send(Method::PUT, path, ApiBody::json(body)?).await?)
    }

    /// `PATCH path` with a JSON body, decoding a JSON response.
    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        decode(self.send(Method::PATCH, path, ApiBody::json(body)?).await?)
    }

    /// `DELETE path`.
    pub async fn delete(&self, path: &str) -> Result<()> {
        ensure_success(self.send(Method::DELETE, path, ApiBody::Empty).await?).map(drop)
    }

    // ------------------------------------------------------------------------
    // Auth flows
    // ------------------------------------------------------------------------

    /// Sign in and persist the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let login: LoginResponse = self
            .post_json(endpoints::LOGIN, &LoginRequest { email, password })
            .await?;
        self.session
            .set_auth(&login.access, &login.refresh, &login.tenant_id)?;
        Ok(login)
    }

    /// Create an account. The backend emails a verification link.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse> {
        self.post_json(endpoints::REGISTER, request).await
    }

    /// Confirm an email address; the backend signs the user in.
    ///
    /// The stored tenant id is kept when the response does not carry one.
    pub async fn verify_email(&self, token: &str) -> Result<VerifyEmailResponse> {
        let verified: VerifyEmailResponse = self
            .get_json_query(endpoints::VERIFY_EMAIL, &[("token", token.to_string())])
            .await?;

        let tenant = verified
            .tenant_id
            .clone()
            .or_else(|| self.session.tenant_id())
            .unwrap_or_default();
        self.session
            .set_auth(&verified.token, &verified.refresh, &tenant)?;
        Ok(verified)
    }

    /// Ask for a password reset email.
    pub async fn request_password_reset(&self, email: &str) -> Result<DetailResponse> {
        self.post_json(endpoints::PASSWORD_RESET, &EmailBody { email })
            .await
    }

    /// Set a new password using the token from the reset email.
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        password: &str,
    ) -> Result<DetailResponse> {
        self.post_json(
            endpoints::PASSWORD_RESET_CONFIRM,
            &ResetConfirmBody { token, password },
        )
        .await
    }

    /// Sign out.
    ///
    /// The refresh token is blacklisted on the backend when possible. The
    /// local session is cleared regardless; a backend failure is returned
    /// after clearing, except when the pipeline already ended the session.
    pub async fn logout(&self) -> Result<()> {
        let remote = match self.session.refresh_token() {
            Some(refresh) => self.blacklist(&refresh).await,
            None => Ok(()),
        };

        self.session.clear_auth()?;

        match remote {
            Err(ClientError::LoginRequired { .. }) => Ok(()),
            Err(err) => {
                log::warn!("Backend logout failed, session cleared locally: {err}");
                Err(err)
            }
            Ok(()) => Ok(()),
        }
    }

    /// The signed-in account.
    pub async fn current_user(&self) -> Result<User> {
        self.get_json(endpoints::CURRENT_USER).await
    }

    async fn blacklist(&self, refresh: &str) -> Result<()> {
        let body = ApiBody::json(&RefreshBody { refresh })?;
        ensure_success(self.send(Method::POST, endpoints::LOGOUT, body).await?).map(drop)
    }

    fn url_with_query(&self, path: &str, params: &[(&str, String)]) -> Result<String> {
        let mut url = reqwest::Url::parse(&self.url(path)).map_err(ClientError::invalid_request)?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.into())
    }

    async fn dispatch(&self, method: Method, url: &str, body: ApiBody) -> Result<Response<Bytes>> {
        let req = Request::builder()
            .method(method)
            .uri(url)
            .body(body)
            .map_err(ClientError::invalid_request)?;
        self.service.clone().oneshot(req).await
    }
}

/// Turn a non-2xx response into [`ClientError::Http`].
fn ensure_success(response: Response<Bytes>) -> Result<Bytes> {
    let status = response.status();
    let body = response.into_body();
    if status.is_success() {
        Ok(body)
    } else {
        Err(ClientError::Http {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

/// Decode a successful JSON response. An empty body decodes as `{}`.
fn decode<T: DeserializeOwned>(response: Response<Bytes>) -> Result<T> {
    let body = ensure_success(response)?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"{}")?);
    }
    Ok(serde_json::from_slice(&body)?)
}
