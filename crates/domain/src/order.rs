//! Order record and its status machine.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{Money, OrderItem, RestaurantId, UserId};

/// Payment lifecycle status of an order.
///
/// Status transitions:
/// ```text
/// pending ──┬──► confirmed
///           ├──► payment_failed
///           └──► cancelled (hard delete)
/// ```
///
/// `confirmed` and `payment_failed` are terminal with respect to the saga;
/// note edits and delivery-status updates remain possible in any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order persisted, settlement outcome not yet applied.
    #[default]
    Pending,

    /// Payment settled successfully.
    Confirmed,

    /// Payment settlement failed.
    PaymentFailed,

    /// Order was cancelled. Cancellation removes the record, so this value
    /// only appears in outbound status updates, never in the store.
    Cancelled,
}

impl OrderStatus {
    /// Returns true if this is a terminal status for the saga.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    /// Returns the status name as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::PaymentFailed => "payment_failed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery progress of an order.
///
/// Owned by the external delivery service; this system stores and returns
/// whatever value it is told, and the saga never mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    OnTheWay,
    Delivered,
}

impl DeliveryStatus {
    /// Returns the status name as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::OnTheWay => "on_the_way",
            DeliveryStatus::Delivered => "delivered",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement outcome reported back from the payment side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Confirmed,
    PaymentFailed,
}

impl PaymentOutcome {
    /// Maps the outcome to the order status it sets.
    pub fn order_status(&self) -> OrderStatus {
        match self {
            PaymentOutcome::Confirmed => OrderStatus::Confirmed,
            PaymentOutcome::PaymentFailed => OrderStatus::PaymentFailed,
        }
    }
}

impl std::fmt::Display for PaymentOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.order_status())
    }
}

/// A persisted order record.
///
/// Items and the derived total are frozen at creation; only `status`,
/// `delivery_status`, and `note` change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub items: Vec<OrderItem>,
    pub total_price: Money,
    pub status: OrderStatus,
    pub delivery_status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Validates the input and builds a new pending order.
    ///
    /// The total price is computed here, once; it is never recomputed after
    /// creation even if item prices change upstream.
    pub fn new(
        user_id: UserId,
        restaurant_id: RestaurantId,
        items: Vec<OrderItem>,
    ) -> Result<Self, DomainError> {
        if user_id.is_blank() {
            return Err(DomainError::MissingField("userId"));
        }
        if restaurant_id.is_blank() {
            return Err(DomainError::MissingField("restaurantId"));
        }
        if items.is_empty() {
            return Err(DomainError::NoItems);
        }
        for item in &items {
            item.validate()?;
        }

        let total_price = items.iter().map(OrderItem::total_price).sum();

        Ok(Self {
            id: OrderId::new(),
            user_id,
            restaurant_id,
            items,
            total_price,
            status: OrderStatus::Pending,
            delivery_status: DeliveryStatus::Pending,
            note: None,
            created_at: Utc::now(),
        })
    }
}
