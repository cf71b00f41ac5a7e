//! Status callback channel from the payment side back to the order side.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::{CorrelationId, OrderId};
use domain::PaymentOutcome;
use serde::Serialize;
use store::{OrderStatusUpdate, OrderStore};

use crate::error::SagaError;

/// Inbound edge of the order coordinator, as seen from the payment side:
/// pushes a settlement outcome onto the order.
///
/// Delivery is at-most-once. There is no acknowledgment or retry beyond
/// the immediate attempt; idempotency comes solely from the unconditional
/// overwrite on the receiving side.
#[async_trait]
pub trait StatusCallback: Send + Sync {
    /// Reports a settlement outcome for the given order.
    async fn notify(
        &self,
        order_id: OrderId,
        outcome: PaymentOutcome,
        correlation_id: &CorrelationId,
    ) -> Result<(), SagaError>;
}

/// In-process callback applying the outcome straight to the order store,
/// with the same unconditional-overwrite semantics as the coordinator's
/// status surface.
pub struct LocalStatusCallback<S: OrderStore> {
    orders: S,
}

impl<S: OrderStore> LocalStatusCallback<S> {
    /// Creates a callback writing into the given order store.
    pub fn new(orders: S) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl<S: OrderStore> StatusCallback for LocalStatusCallback<S> {
    async fn notify(
        &self,
        order_id: OrderId,
        outcome: PaymentOutcome,
        _correlation_id: &CorrelationId,
    ) -> Result<(), SagaError> {
        self.orders
            .update_status(order_id, OrderStatusUpdate::status(outcome.order_status()))
            .await?
            .ok_or(SagaError::OrderNotFound(order_id))?;
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusUpdateBody {
    status: domain::OrderStatus,
}

/// Callback calling a remote order service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStatusCallback {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStatusCallback {
    /// Creates a callback client against the given base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl StatusCallback for HttpStatusCallback {
    async fn notify(
        &self,
        order_id: OrderId,
        outcome: PaymentOutcome,
        correlation_id: &CorrelationId,
    ) -> Result<(), SagaError> {
        let url = format!("{}/orders/{}/status", self.base_url, order_id);
        let response = self
            .client
            .put(&url)
            .header(CorrelationId::HEADER, correlation_id.as_str())
            .json(&StatusUpdateBody {
                status: outcome.order_status(),
            })
            .send()
            .await
            .map_err(|e| SagaError::unavailable("order service", e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SagaError::OrderNotFound(order_id));
        }
        if !response.status().is_success() {
            return Err(SagaError::unavailable(
                "order service",
                format!("status update rejected with status {}", response.status()),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryCallbackState {
    notified: Vec<(OrderId, PaymentOutcome)>,
    fail: bool,
}

/// In-memory callback for tests: records notifications.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatusCallback {
    state: Arc<Mutex<InMemoryCallbackState>>,
}

impl InMemoryStatusCallback {
    /// Creates a new recording callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the callback to fail every notification.
    pub fn set_fail(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    /// Returns every notification delivered so far.
    pub fn notified(&self) -> Vec<(OrderId, PaymentOutcome)> {
        self.state.lock().unwrap().notified.clone()
    }

    /// Returns the number of notifications delivered.
    pub fn notified_count(&self) -> usize {
        self.state.lock().unwrap().notified.len()
    }
}

#[async_trait]
impl StatusCallback for InMemoryStatusCallback {
    async fn notify(
        &self,
        order_id: OrderId,
        outcome: PaymentOutcome,
        _correlation_id: &CorrelationId,
    ) -> Result<(), SagaError> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(SagaError::unavailable("order service", "connection reset"));
        }
        state.notified.push((order_id, outcome));
        Ok(())
    }
}
