use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, PaymentId};
use domain::{Order, Payment, UserId};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::order::{OrderStatusUpdate, OrderStore};
use crate::payment::PaymentStore;

/// In-memory order store.
///
/// Backs the default single-process wiring and the tests; provides the
/// same interface a database-backed implementation would.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders stored.
    pub async fn count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }
}

fn sorted_by_age(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by_key(|o| o.created_at);
    orders
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<Order> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Order>> {
        Ok(sorted_by_age(
            self.orders.read().await.values().cloned().collect(),
        ))
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        Ok(sorted_by_age(
            self.orders
                .read()
                .await
                .values()
                .filter(|o| &o.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn update_status(
        &self,
        id: OrderId,
        update: OrderStatusUpdate,
    ) -> Result<Option<Order>> {
        let mut orders = self.orders.write().await;
        Ok(orders.get_mut(&id).map(|order| {
            if let Some(status) = update.status {
                order.status = status;
            }
            if let Some(delivery_status) = update.delivery_status {
                order.delivery_status = delivery_status;
            }
            order.clone()
        }))
    }

    async fn set_note(&self, id: OrderId, note: Option<String>) -> Result<Option<Order>> {
        let mut orders = self.orders.write().await;
        Ok(orders.get_mut(&id).map(|order| {
            order.note = note;
            order.clone()
        }))
    }

    async fn remove(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.write().await.remove(&id))
    }
}

/// In-memory payment store.
#[derive(Clone, Default)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
}

impl InMemoryPaymentStore {
    /// Creates a new empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of payments stored.
    pub async fn count(&self) -> usize {
        self.payments.read().await.len()
    }

    /// Clears all payments.
    pub async fn clear(&self) {
        self.payments.write().await.clear();
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: Payment) -> Result<Payment> {
        self.payments
            .write()
            .await
            .insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn get(&self, id: PaymentId) -> Result<Option<Payment>> {
        Ok(self.payments.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self.payments.read().await.values().cloned().collect();
        payments.sort_by_key(|p| p.created_at);
        Ok(payments)
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .payments
            .read()
            .await
            .values()
            .filter(|p| &p.user_id == user_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.created_at);
        Ok(payments)
    }

    async fn update(&self, payment: Payment) -> Result<Option<Payment>> {
        let mut payments = self.payments.write().await;
        match payments.get_mut(&payment.id) {
            Some(existing) => {
                *existing = payment.clone();
                Ok(Some(payment))
            }
            None => Ok(None),
        }
    }
}
