//! Command execution.
//!
//! [`App`] wires the configured session, pipeline and guard together and
//! turns each [`Command`] into the text printed for the user. Token values
//! are never part of that text.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::DateTime;
use stockroom_client::models::RegisterRequest;
use stockroom_client::{AdminClient, HttpTransport};
use stockroom_session::{
    FileTokenStore, GuardDecision, HttpTokenRefresher, RouteGuard, SessionManager, decode_expiry,
};

use crate::cli::{Command, PasswordResetAction};
use crate::config::StockroomConfig;
use crate::config_handlers::handle_config_command;
use crate::error::Result;

/// A configured client session.
pub struct App {
    config: StockroomConfig,
    config_path: Option<String>,
    client: AdminClient,
    guard: RouteGuard,
}

impl App {
    /// Open the session described by `config`, persisted in its session file.
    pub fn from_config(config: StockroomConfig, config_path: Option<String>) -> Self {
        let transport = HttpTransport::with_timeout(config.request_timeout());
        let refresher =
            HttpTokenRefresher::with_client(transport.client().clone(), &config.api.base_url);
        let session = SessionManager::builder(
            Arc::new(FileTokenStore::new(config.store_path())),
            Arc::new(refresher),
        )
        .config(config.session_config())
        .build();
        Self::assemble(config, config_path, session, transport)
    }

    /// Use an existing session.
    pub fn with_session(config: StockroomConfig, session: SessionManager) -> Self {
        let transport = HttpTransport::with_timeout(config.request_timeout());
        Self::assemble(config, None, session, transport)
    }

    fn assemble(
        config: StockroomConfig,
        config_path: Option<String>,
        session: SessionManager,
        transport: HttpTransport,
    ) -> Self {
        let client = AdminClient::connect(
            &config.api.base_url,
            session.clone(),
            config.endpoint_policy(),
            transport,
        );
        Self {
            guard: RouteGuard::new(session),
            config,
            config_path,
            client,
        }
    }

    /// The session in use.
    pub fn session(&self) -> &SessionManager {
        self.client.session()
    }

    /// Run one command and return what to print.
    pub async fn execute(&self, command: Command) -> Result<String> {
        match command {
            Command::Login { email, password } => {
                let login = self.client.login(&email, &password).await?;
                let who = login
                    .user
                    .map(|u| u.display_name())
                    .unwrap_or(email);
                Ok(format!("Signed in as {who} (tenant {})", login.tenant_id))
            }
            Command::Logout => Ok(match self.client.logout().await {
                Ok(()) => "Signed out".to_string(),
                Err(err) => format!("Signed out locally; backend logout failed: {err}"),
            }),
            Command::Status => Ok(format!(
                "{}\nstore: {}",
                status_report(self.session()),
                self.store_path().display()
            )),
            Command::Refresh => {
                let token = self.session().refresh_access_token().await?;
                Ok(format!(
                    "Access token refreshed ({})",
                    describe_expiry(&token, self.session().now())
                ))
            }
            Command::Guard { route } => Ok(match self.guard.check(&route).await {
                GuardDecision::Allow => format!("allow {route}"),
                GuardDecision::Redirect { to } => format!("redirect {route} -> {to}"),
            }),
            Command::Get { path } => {
                let value: serde_json::Value = self.client.get_json(&path).await?;
                Ok(serde_json::to_string_pretty(&value)
                    .map_err(stockroom_client::ClientError::from)?)
            }
            Command::Whoami => {
                let user = self.client.current_user().await?;
                Ok(format!(
                    "{} <{}> role {:?}, joined {}",
                    user.display_name(),
                    user.email,
                    user.role,
                    user.date_joined.format("%Y-%m-%d")
                ))
            }
            Command::Register {
                email,
                username,
                password,
                first_name,
                last_name,
                phone_number,
            } => {
                let request = RegisterRequest {
                    email,
                    username,
                    confirm_password: password.clone(),
                    password,
                    first_name,
                    last_name,
                    phone_number,
                };
                let registered = self.client.register(&request).await?;
                Ok(registered.message)
            }
            Command::VerifyEmail { token } => {
                let verified = self.client.verify_email(&token).await?;
                Ok(format!("{} Signed in.", verified.detail).trim().to_string())
            }
            Command::PasswordReset { action } => {
                let ack = match action {
                    PasswordResetAction::Request { email } => {
                        self.client.request_password_reset(&email).await?
                    }
                    PasswordResetAction::Confirm { token, password } => {
                        self.client.confirm_password_reset(&token, &password).await?
                    }
                };
                Ok(ack.detail)
            }
            Command::Config { action } => {
                handle_config_command(self.config_path.as_deref(), action)?;
                Ok(String::new())
            }
        }
    }

    fn store_path(&self) -> PathBuf {
        self.config.store_path()
    }
}

/// Human-readable summary of the stored session.
pub fn status_report(session: &SessionManager) -> String {
    let now = session.now();
    let token_line = |label: &str, token: Option<String>| match token {
        Some(token) => format!("{label}: {}", describe_expiry(&token, now)),
        None => format!("{label}: none"),
    };

    [
        format!(
            "authenticated: {}",
            if session.is_authenticated() { "yes" } else { "no" }
        ),
        token_line("access token", session.access_token()),
        token_line("refresh token", session.refresh_token()),
        format!(
            "tenant: {}",
            session.tenant_id().unwrap_or_else(|| "none".to_string())
        ),
        format!("refresh state: {}", session.state()),
    ]
    .join("\n")
}

fn describe_expiry(token: &str, now: i64) -> String {
    match decode_expiry(token) {
        Ok(exp) => {
            let when = DateTime::from_timestamp(exp, 0)
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| exp.to_string());
            let state = if exp < now { "expired" } else { "valid" };
            format!("{state}, expires {when}")
        }
        Err(_) => "unreadable, treated as expired".to_string(),
    }
}
