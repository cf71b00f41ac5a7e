//! Integration tests for the combined order/payment API.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{FixedSettlement, InMemoryAuditPublisher, InMemoryRestaurantDirectory};
use store::{InMemoryOrderStore, InMemoryPaymentStore};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// Builds an app with restaurant "r1" registered and the settlement
/// outcome pinned.
fn setup(settlement: FixedSettlement) -> (Router, InMemoryAuditPublisher) {
    let directory = InMemoryRestaurantDirectory::new();
    directory.add_restaurant("r1");

    let state = api::create_state(
        InMemoryOrderStore::new(),
        InMemoryPaymentStore::new(),
        Arc::new(directory),
        Arc::new(settlement),
        Duration::from_millis(500),
    );
    let audit = InMemoryAuditPublisher::new();
    let app = api::create_app(state, get_metrics_handle(), Arc::new(audit.clone()));
    (app, audit)
}

async fn request_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn sample_order_body() -> serde_json::Value {
    serde_json::json!({
        "userId": "u1",
        "restaurantId": "r1",
        "items": [
            { "itemId": "i1", "name": "Pizza", "quantity": 2, "price": 1000 }
        ]
    })
}

async fn create_order(app: &Router) -> serde_json::Value {
    let response = request_json(app, "POST", "/orders", Some(sample_order_body())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup(FixedSettlement::always_approve());

    let response = request_json(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_order_settles_to_confirmed() {
    let (app, _) = setup(FixedSettlement::always_approve());

    let created = create_order(&app).await;
    // The creation response is the pre-settlement snapshot.
    assert_eq!(created["status"], "pending");
    assert_eq!(created["deliveryStatus"], "pending");
    assert_eq!(created["totalPrice"], 2000);
    let order_id = created["id"].as_str().unwrap().to_string();

    // Polling the status endpoint reveals the settled state.
    let response = request_json(&app, "GET", &format!("/orders/{order_id}/status"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["orderId"], order_id.as_str());
    assert_eq!(json["status"], "confirmed");
    assert_eq!(json["deliveryStatus"], "pending");

    // Exactly one payment, settled for the order's total.
    let response = request_json(&app, "GET", "/payments", None).await;
    let payments = body_json(response).await;
    let payments = payments.as_array().unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["orderId"], order_id.as_str());
    assert_eq!(payments[0]["amount"], 2000);
    assert_eq!(payments[0]["status"], "completed");
    assert!(payments[0]["processedAt"].is_string());
}

#[tokio::test]
async fn test_create_order_settles_to_payment_failed() {
    let (app, _) = setup(FixedSettlement::always_decline());

    let created = create_order(&app).await;
    let order_id = created["id"].as_str().unwrap().to_string();

    let response = request_json(&app, "GET", &format!("/orders/{order_id}"), None).await;
    let order = body_json(response).await;
    assert_eq!(order["status"], "payment_failed");
    // The total survives the failed settlement untouched.
    assert_eq!(order["totalPrice"], 2000);

    let response = request_json(&app, "GET", "/payments", None).await;
    let payments = body_json(response).await;
    assert_eq!(payments[0]["status"], "failed");
}

#[tokio::test]
async fn test_create_order_unknown_restaurant() {
    let (app, _) = setup(FixedSettlement::always_approve());

    let mut body = sample_order_body();
    body["restaurantId"] = serde_json::json!("r9");
    let response = request_json(&app, "POST", "/orders", Some(body)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Nothing persisted on either side.
    let orders = body_json(request_json(&app, "GET", "/orders", None).await).await;
    assert_eq!(orders.as_array().unwrap().len(), 0);
    let payments = body_json(request_json(&app, "GET", "/payments", None).await).await;
    assert_eq!(payments.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_order_validation_failures() {
    let (app, _) = setup(FixedSettlement::always_approve());

    let mut body = sample_order_body();
    body["items"] = serde_json::json!([]);
    let response = request_json(&app, "POST", "/orders", Some(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut body = sample_order_body();
    body["userId"] = serde_json::json!("");
    let response = request_json(&app, "POST", "/orders", Some(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_order_errors() {
    let (app, _) = setup(FixedSettlement::always_approve());
    let fake_id = uuid::Uuid::new_v4();

    let response = request_json(&app, "GET", &format!("/orders/{fake_id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = request_json(&app, "GET", "/orders/not-a-uuid", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_orders_by_user() {
    let (app, _) = setup(FixedSettlement::always_approve());
    create_order(&app).await;
    create_order(&app).await;

    let orders = body_json(request_json(&app, "GET", "/orders/user/u1", None).await).await;
    assert_eq!(orders.as_array().unwrap().len(), 2);

    let orders = body_json(request_json(&app, "GET", "/orders/user/u2", None).await).await;
    assert_eq!(orders.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_update_order_status() {
    let (app, _) = setup(FixedSettlement::always_approve());
    let created = create_order(&app).await;
    let order_id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/orders/{order_id}/status");

    // Neither field given.
    let response = request_json(&app, "PUT", &uri, Some(serde_json::json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Delivery-only update leaves the order status alone.
    let response = request_json(
        &app,
        "PUT",
        &uri,
        Some(serde_json::json!({ "deliveryStatus": "on_the_way" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let order = body_json(response).await;
    assert_eq!(order["status"], "confirmed");
    assert_eq!(order["deliveryStatus"], "on_the_way");

    let fake_id = uuid::Uuid::new_v4();
    let response = request_json(
        &app,
        "PUT",
        &format!("/orders/{fake_id}/status"),
        Some(serde_json::json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_note_lifecycle() {
    let (app, _) = setup(FixedSettlement::always_approve());
    let created = create_order(&app).await;
    let order_id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/orders/{order_id}/note");

    let response = request_json(
        &app,
        "POST",
        &uri,
        Some(serde_json::json!({ "note": "ring the bell" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Note added");
    assert_eq!(json["order"]["note"], "ring the bell");

    let response = request_json(
        &app,
        "PUT",
        &uri,
        Some(serde_json::json!({ "note": "leave at the door" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Note updated");
    assert_eq!(json["order"]["note"], "leave at the door");

    let response = request_json(&app, "DELETE", &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Note removed");
    assert!(json["order"].get("note").is_none());

    // Empty note is rejected.
    let response = request_json(&app, "POST", &uri, Some(serde_json::json!({ "note": "" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing order is a 404.
    let fake_id = uuid::Uuid::new_v4();
    let response = request_json(
        &app,
        "PUT",
        &format!("/orders/{fake_id}/note"),
        Some(serde_json::json!({ "note": "x" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_order() {
    let (app, _) = setup(FixedSettlement::always_approve());
    let created = create_order(&app).await;
    let order_id = created["id"].as_str().unwrap().to_string();

    let response = request_json(&app, "DELETE", &format!("/orders/{order_id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Order cancelled");
    assert_eq!(json["order"]["id"], order_id.as_str());

    let response = request_json(&app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Cancelling again is a 404 as well.
    let response = request_json(&app, "DELETE", &format!("/orders/{order_id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_payment_directly() {
    let (app, _) = setup(FixedSettlement::always_approve());

    // Missing amount.
    let response = request_json(
        &app,
        "POST",
        "/payments",
        Some(serde_json::json!({ "orderId": uuid::Uuid::new_v4(), "userId": "u1" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Zero amount.
    let response = request_json(
        &app,
        "POST",
        "/payments",
        Some(serde_json::json!({
            "orderId": uuid::Uuid::new_v4(),
            "userId": "u1",
            "amount": 0
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Valid payment for an order this store never saw: the settlement
    // succeeds and the failed callback is swallowed.
    let response = request_json(
        &app,
        "POST",
        "/payments",
        Some(serde_json::json!({
            "orderId": uuid::Uuid::new_v4(),
            "userId": "u1",
            "amount": 500
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let payment = body_json(response).await;
    assert_eq!(payment["status"], "completed");
    assert_eq!(payment["amount"], 500);
    assert_eq!(payment["paymentMethod"], "credit_card");
    assert!(
        payment["transactionId"]
            .as_str()
            .unwrap()
            .starts_with("txn_")
    );
}

#[tokio::test]
async fn test_confirm_payment_is_idempotent() {
    let (app, _) = setup(FixedSettlement::always_decline());
    let created = create_order(&app).await;
    let order_id = created["id"].as_str().unwrap().to_string();

    let payments = body_json(request_json(&app, "GET", "/payments", None).await).await;
    let payment_id = payments[0]["id"].as_str().unwrap().to_string();
    assert_eq!(payments[0]["status"], "failed");

    // Manual override flips the payment and re-notifies the order side.
    let response = request_json(&app, "POST", &format!("/payments/{payment_id}/confirm"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Payment confirmed");
    assert_eq!(json["payment"]["status"], "completed");

    let status = body_json(request_json(&app, "GET", &format!("/orders/{order_id}/status"), None).await).await;
    assert_eq!(status["status"], "confirmed");

    // Second confirm returns the record unchanged.
    let response = request_json(&app, "POST", &format!("/payments/{payment_id}/confirm"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Payment already confirmed");
    assert_eq!(json["payment"]["status"], "completed");
}

#[tokio::test]
async fn test_payment_status_override() {
    let (app, _) = setup(FixedSettlement::always_approve());
    let created = create_order(&app).await;
    let order_id = created["id"].as_str().unwrap().to_string();

    let payments = body_json(request_json(&app, "GET", "/payments", None).await).await;
    let payment_id = payments[0]["id"].as_str().unwrap().to_string();

    // Missing status.
    let response = request_json(
        &app,
        "PUT",
        &format!("/payments/{payment_id}/status"),
        Some(serde_json::json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The override can regress a terminal payment; the order keeps its
    // settled status because no callback fires.
    let response = request_json(
        &app,
        "PUT",
        &format!("/payments/{payment_id}/status"),
        Some(serde_json::json!({ "status": "pending" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payment = body_json(response).await;
    assert_eq!(payment["status"], "pending");

    let status = body_json(request_json(&app, "GET", &format!("/orders/{order_id}/status"), None).await).await;
    assert_eq!(status["status"], "confirmed");
}

#[tokio::test]
async fn test_correlation_id_roundtrip() {
    let (app, audit) = setup(FixedSettlement::always_approve());

    // Supplied id is echoed back.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-correlation-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("x-correlation-id").unwrap(),
        "req-42"
    );

    // Absent id is generated.
    let response = request_json(&app, "GET", "/health", None).await;
    let generated = response.headers().get("x-correlation-id").unwrap();
    assert!(!generated.to_str().unwrap().is_empty());

    // The audit trail carries the same ids.
    let records = audit.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].correlation_id.as_str(), "req-42");
    assert_eq!(records[0].status_code, 200);
}

#[tokio::test]
async fn test_audit_records_service_attribution() {
    let (app, audit) = setup(FixedSettlement::always_approve());

    create_order(&app).await;
    request_json(&app, "GET", "/payments", None).await;

    let records = audit.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].service_name, "order-service");
    assert_eq!(records[0].method, "POST");
    assert_eq!(records[0].status_code, 201);
    assert_eq!(records[1].service_name, "payment-service");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup(FixedSettlement::always_approve());
    create_order(&app).await;

    let response = request_json(&app, "GET", "/metrics", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
