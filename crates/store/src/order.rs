//! Order store trait.

use async_trait::async_trait;
use common::OrderId;
use domain::{DeliveryStatus, Order, OrderStatus, UserId};

use crate::error::Result;

/// Partial status update applied atomically to a single order.
///
/// Fields left as `None` are untouched. Set values overwrite whatever was
/// present; there is no transition guard at this layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderStatusUpdate {
    pub status: Option<OrderStatus>,
    pub delivery_status: Option<DeliveryStatus>,
}

impl OrderStatusUpdate {
    /// A status-only update.
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            delivery_status: None,
        }
    }

    /// Returns true if the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.delivery_status.is_none()
    }
}

/// Persistence operations over order records.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order and returns it.
    async fn insert(&self, order: Order) -> Result<Order>;

    /// Loads an order by ID.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists all orders, oldest first.
    async fn list(&self) -> Result<Vec<Order>>;

    /// Lists all orders placed by the given user, oldest first.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Order>>;

    /// Applies a partial status update and returns the updated order, or
    /// `None` if no order matched.
    async fn update_status(&self, id: OrderId, update: OrderStatusUpdate)
    -> Result<Option<Order>>;

    /// Sets or clears the free-text note and returns the updated order, or
    /// `None` if no order matched.
    async fn set_note(&self, id: OrderId, note: Option<String>) -> Result<Option<Order>>;

    /// Removes an order entirely and returns the removed record, or `None`
    /// if no order matched.
    async fn remove(&self, id: OrderId) -> Result<Option<Order>>;
}
