//! Inventory alerts: low stock and batch expiry.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{Request, Response};
use serde::{Deserialize, Serialize};
use tower::Service;

use super::{PageQuery, PaginatedResponse, member, optional_key};
use crate::body::ApiBody;
use crate::client::AdminClient;
use crate::endpoints;
use crate::error::{ClientError, Result};

/// What raised an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowStock,
    BatchExpiry,
}

impl AlertType {
    /// Wire name, as used in the `type` filter.
    pub fn as_str(self) -> &'static str {
        match self {
            AlertType::LowStock => "low_stock",
            AlertType::BatchExpiry => "batch_expiry",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inventory alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    // The backend serializer spells this field `aler_id`.
    #[serde(alias = "aler_id")]
    pub alert_id: String,
    /// SKU id.
    #[serde(alias = "sku_id")]
    pub sku: String,
    pub sku_name: String,
    pub current_stock: i64,
    #[serde(default)]
    pub threshold: Option<i64>,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub acknowledged: bool,
    /// User id of whoever acknowledged it.
    #[serde(default, deserialize_with = "optional_key")]
    pub acknowledged_by: Option<String>,
    #[serde(default)]
    pub acknowledged_at: Option<DateTime<Utc>>,
}

/// `POST /inventory/alerts/` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAlertRequest {
    /// SKU id.
    pub sku: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i64>,
}

/// `PUT /inventory/alerts/{id}/` body; unset fields are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAlertRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct AcknowledgeBody<'a> {
    acknowledged_by: &'a str,
}

/// Filters for the alert list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertQuery {
    pub kind: Option<AlertType>,
    pub acknowledged: Option<bool>,
    pub page: PageQuery,
}

impl AlertQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = self.page.params();
        if let Some(kind) = self.kind {
            params.push(("type", kind.as_str().to_string()));
        }
        if let Some(acknowledged) = self.acknowledged {
            params.push(("acknowledged", acknowledged.to_string()));
        }
        params
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
    /// `GET /inventory/alerts/` with optional type and acknowledgement filters.
    pub async fn alerts(&self, query: &AlertQuery) -> Result<PaginatedResponse<Alert>> {
        self.get_json_query(endpoints::ALERTS, &query.params())
            .await
    }

    /// Alerts of one type.
    pub async fn alerts_by_type(&self, kind: AlertType) -> Result<PaginatedResponse<Alert>> {
        self.alerts(&AlertQuery {
            kind: Some(kind),
            ..AlertQuery::default()
        })
        .await
    }

    /// Alerts nobody has acknowledged yet.
    pub async fn unacknowledged_alerts(&self) -> Result<PaginatedResponse<Alert>> {
        self.alerts(&AlertQuery {
            acknowledged: Some(false),
            ..AlertQuery::default()
        })
        .await
    }

    /// `GET /inventory/alerts/{id}/`
    pub async fn alert(&self, id: &str) -> Result<Alert> {
        self.get_json(&member(endpoints::ALERTS, id, None)?).await
    }

    /// `POST /inventory/alerts/`
    pub async fn create_alert(&self, request: &CreateAlertRequest) -> Result<Alert> {
        self.post_json(endpoints::ALERTS, request).await
    }

    /// `PUT /inventory/alerts/{id}/`
    pub async fn update_alert(&self, id: &str, request: &UpdateAlertRequest) -> Result<Alert> {
        self.put_json(&member(endpoints::ALERTS, id, None)?, request)
            .await
    }

    /// `DELETE /inventory/alerts/{id}/`
    pub async fn delete_alert(&self, id: &str) -> Result<()> {
        self.delete(&member(endpoints::ALERTS, id, None)?).await
    }

    /// `PATCH /inventory/alerts/{id}/acknowledge/`
    pub async fn acknowledge_alert(&self, id: &str, acknowledged_by: &str) -> Result<Alert> {
        self.patch_json(
            &member(endpoints::ALERTS, id, Some("acknowledge"))?,
            &AcknowledgeBody { acknowledged_by },
        )
        .await
    }

    /// `PATCH /inventory/alerts/{id}/dismiss/`
    pub async fn dismiss_alert(&self, id: &str) -> Result<()> {
        let _: serde::de::IgnoredAny = self
            .patch_json(
                &member(endpoints::ALERTS, id, Some("dismiss"))?,
                &serde_json::Map::new(),
            )
            .await?;
        Ok(())
    }
}
