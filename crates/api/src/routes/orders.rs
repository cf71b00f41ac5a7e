//! Order service endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use common::{CorrelationId, OrderId};
use domain::{DeliveryStatus, Money, Order, OrderItem, OrderStatus};
use serde::{Deserialize, Serialize};
use store::{OrderStatusUpdate, OrderStore, PaymentStore};

use crate::error::ApiError;
use crate::routes::AppState;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub restaurant_id: String,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub item_id: String,
    pub name: String,
    pub quantity: u32,
    /// Price per unit in cents.
    pub price: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub status: Option<OrderStatus>,
    pub delivery_status: Option<DeliveryStatus>,
}

#[derive(Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    pub note: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderMessageResponse {
    pub message: &'static str,
    pub order: Order,
}

// -- Handlers --

/// POST /orders — create a new order and hand the payment off.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Extension(correlation_id): Extension<CorrelationId>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let items: Vec<OrderItem> = req
        .items
        .into_iter()
        .map(|item| {
            OrderItem::new(
                item.item_id,
                item.name,
                item.quantity,
                Money::from_cents(item.price),
            )
        })
        .collect();

    let order = state
        .coordinator
        .create_order(
            req.user_id.into(),
            req.restaurant_id.into(),
            items,
            &correlation_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders — list all orders.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.coordinator.list_orders().await?))
}

/// GET /orders/:id — load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    Ok(Json(state.coordinator.get_order(order_id).await?))
}

/// GET /orders/user/:user_id — list orders placed by a user.
#[tracing::instrument(skip(state))]
pub async fn list_for_user<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(
        state.coordinator.orders_for_user(&user_id.into()).await?,
    ))
}

/// GET /orders/:id/status — order and delivery status.
#[tracing::instrument(skip(state))]
pub async fn status<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(id): Path<String>,
) -> Result<Json<saga::OrderStatusView>, ApiError> {
    let order_id = parse_order_id(&id)?;
    Ok(Json(state.coordinator.get_status(order_id).await?))
}

/// PUT /orders/:id/status — partial status update. Also the inbound edge
/// of the payment status callback.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let update = OrderStatusUpdate {
        status: req.status,
        delivery_status: req.delivery_status,
    };
    Ok(Json(state.coordinator.update_status(order_id, update).await?))
}

/// POST /orders/:id/note — add a note to an order.
#[tracing::instrument(skip(state, req))]
pub async fn add_note<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(id): Path<String>,
    Json(req): Json<NoteRequest>,
) -> Result<(StatusCode, Json<OrderMessageResponse>), ApiError> {
    let order_id = parse_order_id(&id)?;
    let note = require_note(req)?;
    let order = state.coordinator.set_note(order_id, note).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderMessageResponse {
            message: "Note added",
            order,
        }),
    ))
}

/// PUT /orders/:id/note — update the note on an order.
#[tracing::instrument(skip(state, req))]
pub async fn update_note<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(id): Path<String>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<OrderMessageResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let note = require_note(req)?;
    let order = state.coordinator.set_note(order_id, note).await?;
    Ok(Json(OrderMessageResponse {
        message: "Note updated",
        order,
    }))
}

/// DELETE /orders/:id/note — remove the note from an order.
#[tracing::instrument(skip(state))]
pub async fn remove_note<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderMessageResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.coordinator.clear_note(order_id).await?;
    Ok(Json(OrderMessageResponse {
        message: "Note removed",
        order,
    }))
}

/// DELETE /orders/:id — cancel an order (hard delete).
#[tracing::instrument(skip(state))]
pub async fn cancel<S: OrderStore + Clone + 'static, P: PaymentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderMessageResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.coordinator.cancel_order(order_id).await?;
    Ok(Json(OrderMessageResponse {
        message: "Order cancelled",
        order,
    }))
}

fn require_note(req: NoteRequest) -> Result<String, ApiError> {
    if req.note.trim().is_empty() {
        return Err(ApiError::BadRequest("Note is required".to_string()));
    }
    Ok(req.note)
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID format: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
