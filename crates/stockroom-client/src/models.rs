//! Wire types for the auth endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Full access.
    Admin,
    /// Day-to-day operations.
    Manager,
    /// Read only.
    Viewer,
}

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub role: Role,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// "First Last", falling back to the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// `POST /auth/login/` body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `POST /auth/login/` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub tenant_id: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// `POST /auth/register/` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
}

/// `POST /auth/register/` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    #[serde(default)]
    pub verification_token: Option<String>,
}

/// `GET /auth/verify-email/` response. Verification signs the user in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifyEmailResponse {
    #[serde(default)]
    pub detail: String,
    pub token: String,
    pub refresh: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Plain `{ "detail": ... }` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DetailResponse {
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmailBody<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResetConfirmBody<'a> {
    pub token: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshBody<'a> {
    pub refresh: &'a str,
}
