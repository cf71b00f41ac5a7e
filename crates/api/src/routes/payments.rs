//! Payment service endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use common::{CorrelationId, OrderId, PaymentId};
use domain::{Money, Payment, PaymentStatus};
use serde::{Deserialize, Serialize};
use store::{OrderStore, PaymentStore};

use crate::error::ApiError;
use crate::routes::AppState;
use saga::InitiatePayment;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub user_id: String,
    /// Amount in cents.
    pub amount: Option<i64>,
    pub status: Option<PaymentStatus>,
}

#[derive(Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub status: Option<PaymentStatus>,
}

// -- Response types --

#[derive(Serialize)]
pub struct PaymentMessageResponse {
    pub message: &'static str,
    pub payment: Payment,
}

// -- Handlers --

/// POST /payments — create and settle a payment, then notify the order
/// side.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Extension(correlation_id): Extension<CorrelationId>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let order_id = req
        .order_id
        .ok_or_else(|| ApiError::BadRequest("Missing required fields".to_string()))?;
    let amount = req
        .amount
        .ok_or_else(|| ApiError::BadRequest("Missing required fields".to_string()))?;

    let request = InitiatePayment {
        order_id,
        user_id: req.user_id.into(),
        amount: Money::from_cents(amount),
        status: req.status,
    };

    let payment = state.processor.initiate(request, &correlation_id).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /payments — list all payments.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(state.processor.list_payments().await?))
}

/// GET /payments/:id — load a payment by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(id): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    let payment_id = parse_payment_id(&id)?;
    Ok(Json(state.processor.get_payment(payment_id).await?))
}

/// GET /payments/user/:user_id — list payments made by a user.
#[tracing::instrument(skip(state))]
pub async fn list_for_user<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(
        state.processor.payments_for_user(&user_id.into()).await?,
    ))
}

/// POST /payments/:id/confirm — idempotent force-confirm.
#[tracing::instrument(skip(state))]
pub async fn confirm<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Extension(correlation_id): Extension<CorrelationId>,
    Path(id): Path<String>,
) -> Result<Json<PaymentMessageResponse>, ApiError> {
    let payment_id = parse_payment_id(&id)?;
    let confirmation = state.processor.confirm(payment_id, &correlation_id).await?;

    let message = if confirmation.already_completed {
        "Payment already confirmed"
    } else {
        "Payment confirmed"
    };
    Ok(Json(PaymentMessageResponse {
        message,
        payment: confirmation.payment,
    }))
}

/// PUT /payments/:id/status — unconditional status override. Fires no
/// callback, so the linked order can drift out of sync.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<Payment>, ApiError> {
    let payment_id = parse_payment_id(&id)?;
    let status = req
        .status
        .ok_or_else(|| ApiError::BadRequest("status is required".to_string()))?;
    Ok(Json(state.processor.update_status(payment_id, status).await?))
}

fn parse_payment_id(id: &str) -> Result<PaymentId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid payment ID format: {e}")))?;
    Ok(PaymentId::from_uuid(uuid))
}
