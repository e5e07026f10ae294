//! Typed resource calls: paths, methods, query strings and bodies on the wire.

use serde_json::{Value, json};
use stockroom_client::resources::alerts::{AlertQuery, AlertType, CreateAlertRequest};
use stockroom_client::resources::inventory::{
    AdjustmentReason, CreateBatchRequest, CreateSkuRequest, StockAdjustmentRequest,
    UpdateSkuRequest,
};
use stockroom_client::resources::orders::{
    CreateOrderRequest, NewOrderItem, OrderStatus, PaymentStatus, PaystackInitRequest,
    ReturnRequest, TransactionStatus, UpdateOrderRequest,
};
use stockroom_client::{ClientError, PageQuery};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{Harness, NOW, mint};

const STAMP: &str = "2025-06-01T10:00:00Z";

fn no_query(req: &wiremock::Request) -> bool {
    req.url.query().is_none()
}

fn order_json(id: &str, status: &str) -> Value {
    json!({
        "order_id": id,
        "customer_name": "Ada Ng",
        "items": [{ "item_id": "i-1", "sku_id": "s-1", "quantity": 2 }],
        "total_amount": "1000.00",
        "status": status,
        "payment_status": "unpaid",
        "tenant_id": "acme",
        "created_at": STAMP,
        "updated_at": STAMP
    })
}

fn payment_json(status: &str) -> Value {
    json!({
        "transaction_id": "t-1",
        "order": "o-1",
        "reference": "ref_o1",
        "amount": "1000.00",
        "currency": "NGN",
        "authorization_url": "https://checkout.paystack.com/ref_o1",
        "status": status,
        "paid_at": null,
        "created_at": STAMP
    })
}

fn sku_json(stock_level: i64) -> Value {
    json!({
        "sku_id": "s-1",
        "name": "Palm oil 5L",
        "sku_code": "PO-5",
        "category": "oils",
        "attributes": {},
        "barcode": null,
        "price": "45.00",
        "stock_level": stock_level,
        "supplier_id": null,
        "track_batches": true,
        "reorder_threshold": 5,
        "created_at": STAMP,
        "updated_at": STAMP
    })
}

fn alert_json(acknowledged: bool) -> Value {
    json!({
        "alert_id": "a-1",
        "sku": "s-1",
        "sku_name": "Palm oil 5L",
        "current_stock": 2,
        "threshold": 5,
        "type": "low_stock",
        "created_at": STAMP,
        "acknowledged": acknowledged,
        "acknowledged_by": if acknowledged { json!(12) } else { Value::Null },
        "acknowledged_at": if acknowledged { json!(STAMP) } else { Value::Null }
    })
}

fn product_json(id: &str) -> Value {
    json!({
        "sku_id": id,
        "tenant_id": "acme",
        "name": "Jollof rice 1kg",
        "category": "c-1",
        "attributes": {},
        "barcode": null,
        "price": "12.50",
        "supplier_id": null,
        "batch_number": null,
        "expiry_date": null,
        "created_at": STAMP,
        "updated_at": STAMP
    })
}

fn page(results: Vec<Value>, next: Option<&str>) -> Value {
    json!({ "count": results.len(), "next": next, "previous": null, "results": results })
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_orders_list_sends_paging_and_search() {
    let harness = Harness::start().await;
    let (access, _) = harness.sign_in(NOW + 300);

    Mock::given(method("GET"))
        .and(path("/api/orders/"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "10"))
        .and(query_param("search", "ada ng"))
        .and(header("authorization", format!("Bearer {access}").as_str()))
        .and(header("x-tenant-id", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            vec![order_json("o-1", "pending"), order_json("o-2", "delivered")],
            Some("http://backend/api/orders/?page=3"),
        )))
        .expect(1)
        .mount(&harness.server)
        .await;

    let orders = harness
        .client
        .orders(&PageQuery::page(2, 10).search("ada ng"))
        .await
        .unwrap();

    assert_eq!(orders.count, 2);
    assert!(orders.has_next());
    assert_eq!(orders.results[1].status, OrderStatus::Delivered);
    assert_eq!(orders.results[0].total_amount, 1000.0);
}

#[tokio::test]
async fn test_order_crud() {
    let harness = Harness::start().await;
    harness.sign_in(NOW + 300);

    Mock::given(method("GET"))
        .and(path("/api/orders/o-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_json("o-1", "pending")))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/orders/"))
        .and(body_json(json!({
            "customer_name": "Ada Ng",
            "items": [{ "sku_id": "s-1", "quantity": 2 }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(order_json("o-1", "pending")))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/orders/o-1/"))
        .and(body_json(json!({ "status": "processing" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_json("o-1", "processing")))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/orders/o-1/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&harness.server)
        .await;

    let fetched = harness.client.order("o-1").await.unwrap();
    assert_eq!(fetched.customer_name, "Ada Ng");

    let created = harness
        .client
        .create_order(&CreateOrderRequest {
            customer_name: "Ada Ng".to_string(),
            items: vec![NewOrderItem {
                sku_id: "s-1".to_string(),
                quantity: 2,
            }],
        })
        .await
        .unwrap();
    assert_eq!(created.payment_status, PaymentStatus::Unpaid);

    let updated = harness
        .client
        .update_order(
            "o-1",
            &UpdateOrderRequest {
                status: Some(OrderStatus::Processing),
                payment_status: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Processing);

    harness.client.delete_order("o-1").await.unwrap();
}

#[tokio::test]
async fn test_order_stats() {
    let harness = Harness::start().await;
    harness.sign_in(NOW + 300);

    Mock::given(method("GET"))
        .and(path("/api/orders/stats/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalOrders": 12,
            "pendingOrders": 3,
            "processingOrders": 2,
            "deliveredOrders": 6,
            "cancelledOrders": 1,
            "totalRevenue": 15400.5,
            "pendingPayments": 3,
            "failedPayments": 0
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let stats = harness.client.order_stats().await.unwrap();
    assert_eq!(stats.total_orders, 12);
    assert_eq!(stats.delivered_orders, 6);
    assert_eq!(stats.total_revenue, 15400.5);
}

#[tokio::test]
async fn test_paystack_initialize_and_verify() {
    let harness = Harness::start().await;
    harness.sign_in(NOW + 300);

    Mock::given(method("POST"))
        .and(path("/api/orders/payments/paystack/initialize/"))
        .and(body_json(json!({ "order_id": "o-1", "customer_email": "ada@acme.test" })))
        .and(header("x-tenant-id", "acme"))
        .respond_with(ResponseTemplate::new(201).set_body_json(payment_json("initialized")))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/orders/payments/paystack/verify/ref_o1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payment_json("success")))
        .expect(1)
        .mount(&harness.server)
        .await;

    let started = harness
        .client
        .initiate_payment(&PaystackInitRequest {
            order_id: "o-1".to_string(),
            customer_email: "ada@acme.test".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(started.status, TransactionStatus::Initialized);
    assert!(started.authorization_url.is_some());

    let verified = harness.client.verify_payment(&started.reference).await.unwrap();
    assert!(verified.is_paid());
}

#[tokio::test]
async fn test_payment_listings() {
    let harness = Harness::start().await;
    harness.sign_in(NOW + 300);

    Mock::given(method("GET"))
        .and(path("/api/orders/transactions/"))
        .and(no_query)
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(vec![payment_json("success")], None)),
        )
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/orders/transactions/t-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payment_json("failed")))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/orders/o-1/transactions/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([payment_json("success")])))
        .expect(1)
        .mount(&harness.server)
        .await;

    let all = harness.client.payments(&PageQuery::default()).await.unwrap();
    assert_eq!(all.count, 1);

    let one = harness.client.payment("t-1").await.unwrap();
    assert_eq!(one.status, TransactionStatus::Failed);

    let for_order = harness.client.order_payments("o-1").await.unwrap();
    assert_eq!(for_order.len(), 1);
    assert_eq!(for_order[0].order, "o-1");
}

#[tokio::test]
async fn test_order_returns() {
    let harness = Harness::start().await;
    harness.sign_in(NOW + 300);
    let record = json!({
        "return_id": "r-1",
        "order": "o-1",
        "reason": "Damaged in transit",
        "created_at": STAMP
    });

    Mock::given(method("POST"))
        .and(path("/api/orders/o-1/return/"))
        .and(body_json(json!({ "reason": "Damaged in transit", "restock": true })))
        .respond_with(ResponseTemplate::new(201).set_body_json(record.clone()))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/orders/o-1/returns/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![record], None)))
        .expect(1)
        .mount(&harness.server)
        .await;

    let filed = harness
        .client
        .request_return(
            "o-1",
            &ReturnRequest {
                reason: "Damaged in transit".to_string(),
                restock: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(filed.return_id, "r-1");

    let returns = harness.client.order_returns("o-1").await.unwrap();
    assert_eq!(returns, vec![filed]);
}

// ============================================================================
// Inventory
// ============================================================================

#[tokio::test]
async fn test_sku_crud() {
    let harness = Harness::start().await;
    harness.sign_in(NOW + 300);

    Mock::given(method("GET"))
        .and(path("/api/inventory/skus/"))
        .and(no_query)
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![sku_json(4)], None)))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/skus/s-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sku_json(4)))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/inventory/skus/"))
        .and(body_json(json!({
            "name": "Palm oil 5L",
            "category": "oils",
            "price": 45.0,
            "sku_code": "PO-5",
            "track_batches": true,
            "reorder_threshold": 5
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(sku_json(0)))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/inventory/skus/s-1/"))
        .and(body_json(json!({ "price": 47.5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(sku_json(4)))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/inventory/skus/s-1/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&harness.server)
        .await;

    let listed = harness.client.skus(&PageQuery::default()).await.unwrap();
    assert!(listed.results[0].needs_reorder());

    assert_eq!(harness.client.sku("s-1").await.unwrap().stock_level, 4);

    let created = harness
        .client
        .create_sku(&CreateSkuRequest {
            name: "Palm oil 5L".to_string(),
            category: "oils".to_string(),
            price: 45.0,
            sku_code: Some("PO-5".to_string()),
            track_batches: true,
            reorder_threshold: Some(5),
            ..CreateSkuRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(created.stock_level, 0);

    harness
        .client
        .update_sku(
            "s-1",
            &UpdateSkuRequest {
                price: Some(47.5),
                ..UpdateSkuRequest::default()
            },
        )
        .await
        .unwrap();

    harness.client.delete_sku("s-1").await.unwrap();
}

#[tokio::test]
async fn test_stock_adjustment_and_batches() {
    let harness = Harness::start().await;
    harness.sign_in(NOW + 300);
    let batch = json!({
        "batch_id": "b-1",
        "sku": "s-1",
        "batch_number": "LOT-7",
        "quantity": 20,
        "remaining_quantity": 20,
        "received_at": "2025-05-01",
        "expiry_date": "2025-12-31",
        "cost_price": "30.00",
        "created_at": STAMP
    });

    Mock::given(method("POST"))
        .and(path("/api/inventory/skus/s-1/stock-adjustments/"))
        .and(body_json(json!({ "quantity": 20, "reason": "purchase", "note": "restock" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(sku_json(24)))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/inventory/skus/s-1/batches/"))
        .and(body_json(json!({
            "batch_number": "LOT-7",
            "quantity": 20,
            "cost_price": 30.0,
            "expiry_date": "2025-12-31"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(batch.clone()))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/skus/s-1/batches/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([batch])))
        .expect(1)
        .mount(&harness.server)
        .await;

    let mut adjustment = StockAdjustmentRequest::new(20, AdjustmentReason::Purchase);
    adjustment.note = Some("restock".to_string());
    let adjusted = harness.client.adjust_stock("s-1", &adjustment).await.unwrap();
    assert_eq!(adjusted.stock_level, 24);
    assert!(!adjusted.needs_reorder());

    let created = harness
        .client
        .create_batch(
            "s-1",
            &CreateBatchRequest {
                batch_number: "LOT-7".to_string(),
                quantity: 20,
                cost_price: 30.0,
                received_at: None,
                expiry_date: chrono::NaiveDate::from_ymd_opt(2025, 12, 31),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.remaining_quantity, 20);

    let batches = harness.client.sku_batches("s-1").await.unwrap();
    assert_eq!(batches, vec![created]);
}

// ============================================================================
// Alerts
// ============================================================================

#[tokio::test]
async fn test_alert_filters_reach_the_query_string() {
    let harness = Harness::start().await;
    harness.sign_in(NOW + 300);

    Mock::given(method("GET"))
        .and(path("/api/inventory/alerts/"))
        .and(query_param("type", "batch_expiry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/alerts/"))
        .and(query_param("acknowledged", "false"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(vec![alert_json(false)], None)),
        )
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/alerts/"))
        .and(query_param("type", "low_stock"))
        .and(query_param("acknowledged", "true"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![alert_json(true)], None)))
        .expect(1)
        .mount(&harness.server)
        .await;

    let expiring = harness
        .client
        .alerts_by_type(AlertType::BatchExpiry)
        .await
        .unwrap();
    assert!(expiring.is_empty());

    let open = harness.client.unacknowledged_alerts().await.unwrap();
    assert_eq!(open.results.len(), 1);
    assert!(!open.results[0].acknowledged);

    let handled = harness
        .client
        .alerts(&AlertQuery {
            kind: Some(AlertType::LowStock),
            acknowledged: Some(true),
            page: PageQuery::page(1, 50),
        })
        .await
        .unwrap();
    assert_eq!(handled.results[0].acknowledged_by.as_deref(), Some("12"));
}

#[tokio::test]
async fn test_alert_lifecycle() {
    let harness = Harness::start().await;
    harness.sign_in(NOW + 300);

    Mock::given(method("POST"))
        .and(path("/api/inventory/alerts/"))
        .and(body_json(json!({ "sku": "s-1", "type": "low_stock", "threshold": 5 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(alert_json(false)))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/alerts/a-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alert_json(false)))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/inventory/alerts/a-1/acknowledge/"))
        .and(body_json(json!({ "acknowledged_by": "12" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(alert_json(true)))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/inventory/alerts/a-1/dismiss/"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/inventory/alerts/a-1/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&harness.server)
        .await;

    let created = harness
        .client
        .create_alert(&CreateAlertRequest {
            sku: "s-1".to_string(),
            kind: AlertType::LowStock,
            threshold: Some(5),
        })
        .await
        .unwrap();
    assert_eq!(created.alert_id, "a-1");

    assert!(!harness.client.alert("a-1").await.unwrap().acknowledged);

    let acknowledged = harness.client.acknowledge_alert("a-1", "12").await.unwrap();
    assert!(acknowledged.acknowledged);

    harness.client.dismiss_alert("a-1").await.unwrap();
    harness.client.delete_alert("a-1").await.unwrap();
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_catalog_queries() {
    let harness = Harness::start().await;
    harness.sign_in(NOW + 300);

    Mock::given(method("GET"))
        .and(path("/api/catalog/categories/"))
        .and(no_query)
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            vec![json!({
                "id": "c-1",
                "tenant_id": "acme",
                "name": "Grains",
                "description": null,
                "created_at": STAMP,
                "updated_at": STAMP
            })],
            None,
        )))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/catalog/products/"))
        .and(query_param("category", "c-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![product_json("p-1")], None)))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/catalog/products/"))
        .and(query_param("search", "jollof & rice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![product_json("p-1")], None)))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/catalog/products/p-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_json("p-1")))
        .expect(1)
        .mount(&harness.server)
        .await;

    let categories = harness
        .client
        .categories(&PageQuery::default())
        .await
        .unwrap();
    assert_eq!(categories.results[0].name, "Grains");

    let in_category = harness.client.products_by_category("c-1").await.unwrap();
    assert_eq!(in_category.results[0].category.as_deref(), Some("c-1"));

    let found = harness.client.search_products("jollof & rice").await.unwrap();
    assert_eq!(found.count, 1);

    let product = harness.client.product("p-1").await.unwrap();
    assert_eq!(product.price, 12.5);
}

// ============================================================================
// Pipeline interplay
// ============================================================================

#[tokio::test]
async fn test_resource_call_refreshes_expired_session() {
    let harness = Harness::start().await;
    harness.sign_in(NOW - 10);
    let fresh = mint("access", NOW + 300);

    Mock::given(method("GET"))
        .and(path("/api/inventory/skus/s-1/"))
        .and(crate::common::no_authorization)
        .respond_with(ResponseTemplate::new(401))
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
        .and(path("/api/inventory/skus/s-1/"))
        .and(header("authorization", format!("Bearer {fresh}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(sku_json(9)))
        .expect(1)
        .mount(&harness.server)
        .await;

    let sku = harness.client.sku("s-1").await.unwrap();
    assert_eq!(sku.stock_level, 9);
}

#[tokio::test]
async fn test_reserved_characters_in_id_never_reach_the_network() {
    let harness = Harness::start().await;
    harness.sign_in(NOW + 300);

    let err = harness.client.order("../auth/logout").await.unwrap_err();

    assert!(matches!(err, ClientError::InvalidRequest(_)));
    assert!(harness.server.received_requests().await.unwrap().is_empty());
}
