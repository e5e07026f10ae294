//! Inventory SKUs, their batches and stock adjustments.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use http::{Request, Response};
use serde::{Deserialize, Serialize};
use tower::Service;

use super::{PageQuery, PaginatedResponse, amount, member};
use crate::body::ApiBody;
use crate::client::AdminClient;
use crate::endpoints;
use crate::error::{ClientError, Result};

type Attributes = serde_json::Map<String, serde_json::Value>;

/// A stock-keeping unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sku {
    pub sku_id: String,
    pub name: String,
    #[serde(default)]
    pub sku_code: Option<String>,
    pub category: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(deserialize_with = "amount")]
    pub price: f64,
    pub stock_level: i64,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub track_batches: bool,
    #[serde(default)]
    pub reorder_threshold: Option<i64>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sku {
    /// Whether stock is at or below the reorder threshold.
    pub fn needs_reorder(&self) -> bool {
        self.reorder_threshold
            .is_some_and(|threshold| self.stock_level <= threshold)
    }
}

/// `POST /inventory/skus/` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateSkuRequest {
    pub name: String,
    pub category: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub track_batches: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder_threshold: Option<i64>,
}

/// `PUT /inventory/skus/{id}/` body; unset fields are left out.
///
/// Stock level is not writable here; use [`AdminClient::adjust_stock`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateSkuRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_batches: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder_threshold: Option<i64>,
}

/// Why stock moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    Purchase,
    Sale,
    Return,
    Correction,
    Transfer,
}

/// `POST /inventory/skus/{id}/stock-adjustments/` body.
///
/// `quantity` is signed: negative values remove stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustmentRequest {
    pub quantity: i64,
    pub reason: AdjustmentReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl StockAdjustmentRequest {
    /// Adjustment of `quantity` for `reason` with no batch or note.
    pub fn new(quantity: i64, reason: AdjustmentReason) -> Self {
        Self {
            quantity,
            reason,
            batch_id: None,
            reference: None,
            note: None,
        }
    }
}

/// A received batch of a SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: String,
    /// SKU id.
    #[serde(alias = "sku_id")]
    pub sku: String,
    pub batch_number: String,
    pub quantity: i64,
    pub remaining_quantity: i64,
    #[serde(default)]
    pub received_at: Option<NaiveDate>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(deserialize_with = "amount")]
    pub cost_price: f64,
    pub created_at: DateTime<Utc>,
}

impl Batch {
    /// Whether the batch has expired as of `today`.
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry < today)
    }
}

/// `POST /inventory/skus/{id}/batches/` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBatchRequest {
    pub batch_number: String,
    pub quantity: i64,
    pub cost_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
}

impl<S> AdminClient<S>
where
    S: Service<Request<ApiBody>, Response = Response<Bytes>, Error = ClientError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    /// `GET /inventory/skus/`
    pub async fn skus(&self, page: &PageQuery) -> Result<PaginatedResponse<Sku>> {
        self.get_json_query(endpoints::SKUS, &page.params()).await
    }

    /// `GET /inventory/skus/{id}/`
    pub async fn sku(&self, id: &str) -> Result<Sku> {
        self.get_json(&member(endpoints::SKUS, id, None)?).await
    }

    /// `POST /inventory/skus/`
    pub async fn create_sku(&self, request: &CreateSkuRequest) -> Result<Sku> {
        self.post_json(endpoints::SKUS, request).await
    }

    /// `PUT /inventory/skus/{id}/`
    pub async fn update_sku(&self, id: &str, request: &UpdateSkuRequest) -> Result<Sku> {
        self.put_json(&member(endpoints::SKUS, id, None)?, request)
            .await
    }

    /// `DELETE /inventory/skus/{id}/`
    pub async fn delete_sku(&self, id: &str) -> Result<()> {
        self.delete(&member(endpoints::SKUS, id, None)?).await
    }

    /// Move stock up or down; returns the SKU with its new level.
    pub async fn adjust_stock(
        &self,
        sku_id: &str,
        adjustment: &StockAdjustmentRequest,
    ) -> Result<Sku> {
        self.post_json(
            &member(endpoints::SKUS, sku_id, Some("stock-adjustments"))?,
            adjustment,
        )
        .await
    }

    /// `GET /inventory/skus/{id}/batches/`
    pub async fn sku_batches(&self, sku_id: &str) -> Result<Vec<Batch>> {
        let page: PaginatedResponse<Batch> = self
            .get_json(&member(endpoints::SKUS, sku_id, Some("batches"))?)
            .await?;
        Ok(page.results)
    }

    /// `POST /inventory/skus/{id}/batches/`
    pub async fn create_batch(&self, sku_id: &str, batch: &CreateBatchRequest) -> Result<Batch> {
        self.post_json(&member(endpoints::SKUS, sku_id, Some("batches"))?, batch)
            .await
    }
}
