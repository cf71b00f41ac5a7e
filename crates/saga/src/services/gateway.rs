//! Payment initiation handoff from the order side to the payment side.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::{CorrelationId, OrderId};
use domain::{Money, PaymentStatus, UserId};
use serde::{Deserialize, Serialize};
use store::PaymentStore;

use crate::error::SagaError;
use crate::processor::PaymentProcessor;

/// Request handed from the order coordinator to the payment processor to
/// start settlement. Doubles as the `POST /payments` wire body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePayment {
    pub order_id: OrderId,
    pub user_id: UserId,
    /// Copied from the order's total at creation time.
    pub amount: Money,
    /// Requested initial status; settlement overwrites it either way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
}

/// Outbound edge of the order coordinator: hands a settlement request to
/// the payment side.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Dispatches a payment initiation. Settlement and the resulting
    /// status callback are the payment side's business; the caller only
    /// learns whether the handoff itself was accepted.
    async fn initiate(
        &self,
        request: InitiatePayment,
        correlation_id: &CorrelationId,
    ) -> Result<(), SagaError>;
}

/// In-process gateway wrapping a [`PaymentProcessor`] directly.
///
/// The processor settles inline, so by the time this returns the callback
/// has already run, matching the synchronous chain of a blocking HTTP hop
/// to a colocated payment service.
pub struct LocalPaymentGateway<P: PaymentStore> {
    processor: Arc<PaymentProcessor<P>>,
}

impl<P: PaymentStore> LocalPaymentGateway<P> {
    /// Creates a gateway over an in-process payment processor.
    pub fn new(processor: Arc<PaymentProcessor<P>>) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl<P: PaymentStore + 'static> PaymentGateway for LocalPaymentGateway<P> {
    async fn initiate(
        &self,
        request: InitiatePayment,
        correlation_id: &CorrelationId,
    ) -> Result<(), SagaError> {
        self.processor.initiate(request, correlation_id).await?;
        Ok(())
    }
}

/// Gateway calling a remote payment service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentGateway {
    /// Creates a gateway client against the given base URL.
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
impl PaymentGateway for HttpPaymentGateway {
    async fn initiate(
        &self,
        request: InitiatePayment,
        correlation_id: &CorrelationId,
    ) -> Result<(), SagaError> {
        let url = format!("{}/payments", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(CorrelationId::HEADER, correlation_id.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| SagaError::unavailable("payment service", e))?;

        if !response.status().is_success() {
            return Err(SagaError::unavailable(
                "payment service",
                format!("initiation rejected with status {}", response.status()),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    initiated: Vec<InitiatePayment>,
    unavailable: bool,
}

/// In-memory gateway for tests: records handoffs without settling anything.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<Mutex<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new recording gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to reject every handoff.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    /// Returns every handoff accepted so far.
    pub fn initiated(&self) -> Vec<InitiatePayment> {
        self.state.lock().unwrap().initiated.clone()
    }

    /// Returns the number of handoffs accepted.
    pub fn initiated_count(&self) -> usize {
        self.state.lock().unwrap().initiated.len()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn initiate(
        &self,
        request: InitiatePayment,
        _correlation_id: &CorrelationId,
    ) -> Result<(), SagaError> {
        let mut state = self.state.lock().unwrap();
        if state.unavailable {
            return Err(SagaError::unavailable(
                "payment service",
                "connection refused",
            ));
        }
        state.initiated.push(request);
        Ok(())
    }
}
