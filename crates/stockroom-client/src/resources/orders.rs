//! Orders, Paystack payments and returns.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{Request, Response};
use serde::{Deserialize, Serialize};
use tower::Service;

use super::{PageQuery, PaginatedResponse, amount, member};
use crate::body::ApiBody;
use crate::client::AdminClient;
use crate::endpoints;
use crate::error::{ClientError, Result};

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// State of a Paystack transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Initialized,
    Success,
    Failed,
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(alias = "id")]
    pub order_id: String,
    pub customer_name: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(deserialize_with = "amount")]
    pub total_amount: f64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub item_id: Option<String>,
    pub sku_id: String,
    pub quantity: u32,
}

/// `POST /orders/` body. The backend prices the items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub items: Vec<NewOrderItem>,
}

/// A line of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub sku_id: String,
    pub quantity: u32,
}

/// `PATCH /orders/{id}/` body; unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
}

/// Order counts and revenue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub processing_orders: u64,
    pub delivered_orders: u64,
    pub cancelled_orders: u64,
    pub total_revenue: f64,
    pub pending_payments: u64,
    pub failed_payments: u64,
}

impl OrderStats {
    /// Tally a list of orders locally.
    ///
    /// Revenue counts paid orders only.
    pub fn tally<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        orders.into_iter().fold(Self::default(), |mut stats, order| {
            stats.total_orders += 1;
            match order.status {
                OrderStatus::Pending => stats.pending_orders += 1,
                OrderStatus::Processing | OrderStatus::Shipped => stats.processing_orders += 1,
                OrderStatus::Delivered => stats.delivered_orders += 1,
                OrderStatus::Cancelled => stats.cancelled_orders += 1,
            }
            match order.payment_status {
                PaymentStatus::Paid => stats.total_revenue += order.total_amount,
                PaymentStatus::Unpaid | PaymentStatus::Pending => stats.pending_payments += 1,
                PaymentStatus::Failed => stats.failed_payments += 1,
                PaymentStatus::Refunded => {}
            }
            stats
        })
    }
}

/// A Paystack transaction recorded against an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(alias = "id")]
    pub transaction_id: String,
    /// Order id.
    pub order: String,
    pub reference: String,
    #[serde(deserialize_with = "amount")]
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub authorization_url: Option<String>,
    pub status: TransactionStatus,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Whether Paystack confirmed the charge.
    pub fn is_paid(&self) -> bool {
        self.status == TransactionStatus::Success
    }
}

/// `POST /orders/payments/paystack/initialize/` body.
///
/// The amount is taken from the order on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaystackInitRequest {
    pub order_id: String,
    pub customer_email: String,
}

/// `POST /orders/{id}/return/` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub reason: String,
    #[serde(default)]
    pub restock: bool,
}

/// A return filed against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReturn {
    pub return_id: String,
    /// Order id.
    pub order: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl<S> AdminClient<S>
where
    S: Service<Request<ApiBody>, Response = Response<Bytes>, Error = ClientError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    /// `GET /orders/?page=&page_size=&search=`
    pub async fn orders(&self, page: &PageQuery) -> Result<PaginatedResponse<Order>> {
        self.get_json_query(endpoints::ORDERS, &page.params()).await
    }

    /// `GET /orders/{id}/`
    pub async fn order(&self, id: &str) -> Result<Order> {
        self.get_json(&member(endpoints::ORDERS, id, None)?).await
    }

    /// `POST /orders/`
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order> {
        self.post_json(endpoints::ORDERS, request).await
    }

    /// `PATCH /orders/{id}/`
    pub async fn update_order(&self, id: &str, request: &UpdateOrderRequest) -> Result<Order> {
        self.patch_json(&member(endpoints::ORDERS, id, None)?, request)
            .await
    }

    /// `DELETE /orders/{id}/`
    pub async fn delete_order(&self, id: &str) -> Result<()> {
        self.delete(&member(endpoints::ORDERS, id, None)?).await
    }

    /// `GET /orders/stats/`
    pub async fn order_stats(&self) -> Result<OrderStats> {
        self.get_json(endpoints::ORDER_STATS).await
    }

    /// `GET /orders/transactions/`
    pub async fn payments(&self, page: &PageQuery) -> Result<PaginatedResponse<Payment>> {
        self.get_json_query(endpoints::TRANSACTIONS, &page.params())
            .await
    }

    /// `GET /orders/transactions/{id}/`
    pub async fn payment(&self, id: &str) -> Result<Payment> {
        self.get_json(&member(endpoints::TRANSACTIONS, id, None)?)
            .await
    }

    /// `GET /orders/{id}/transactions/`
    pub async fn order_payments(&self, order_id: &str) -> Result<Vec<Payment>> {
        let page: PaginatedResponse<Payment> = self
            .get_json(&member(endpoints::ORDERS, order_id, Some("transactions"))?)
            .await?;
        Ok(page.results)
    }

    /// Start a Paystack checkout for an order.
    pub async fn initiate_payment(&self, request: &PaystackInitRequest) -> Result<Payment> {
        self.post_json(endpoints::PAYSTACK_INITIALIZE, request)
            .await
    }

    /// Ask the backend to verify a Paystack reference and record the result.
    pub async fn verify_payment(&self, reference: &str) -> Result<Payment> {
        self.get_json(&member(endpoints::PAYSTACK_VERIFY, reference, None)?)
            .await
    }

    /// `POST /orders/{id}/return/`
    pub async fn request_return(
        &self,
        order_id: &str,
        request: &ReturnRequest,
    ) -> Result<OrderReturn> {
        self.post_json(&member(endpoints::ORDERS, order_id, Some("return"))?, request)
            .await
    }

    /// `GET /orders/{id}/returns/`
    pub async fn order_returns(&self, order_id: &str) -> Result<Vec<OrderReturn>> {
        let page: PaginatedResponse<OrderReturn> = self
            .get_json(&member(endpoints::ORDERS, order_id, Some("returns"))?)
            .await?;
        Ok(page.results)
    }
}
