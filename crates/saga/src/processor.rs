//! Payment processor: settlement and the outcome callback.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{CorrelationId, OrderId, PaymentId};
use domain::{Payment, PaymentOutcome, PaymentStatus, UserId};
use store::PaymentStore;

use crate::error::{Result, SagaError};
use crate::services::callback::StatusCallback;
use crate::services::gateway::InitiatePayment;
use crate::settlement::{SettlementOutcome, SettlementStrategy};

/// Result of a confirm operation.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub payment: Payment,
    /// True if the payment was already completed and nothing changed.
    pub already_completed: bool,
}

/// Executes payment settlement and reports outcomes back to the order
/// side.
///
/// The payment store is the processor's exclusively-owned state; the order
/// side is only ever reached through the status callback seam.
pub struct PaymentProcessor<P: PaymentStore> {
    payments: P,
    settlement: Arc<dyn SettlementStrategy>,
    callback: Arc<dyn StatusCallback>,
    call_timeout: Duration,
}

impl<P: PaymentStore> PaymentProcessor<P> {
    /// Creates a new payment processor.
    pub fn new(
        payments: P,
        settlement: Arc<dyn SettlementStrategy>,
        callback: Arc<dyn StatusCallback>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            payments,
            settlement,
            callback,
            call_timeout,
        }
    }

    /// Settles a payment initiation and persists the terminal record.
    ///
    /// The status callback is best-effort: if the order side is
    /// unreachable the payment record keeps the true outcome while the
    /// order never learns it. No reconciliation exists.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn initiate(
        &self,
        request: InitiatePayment,
        correlation_id: &CorrelationId,
    ) -> Result<Payment> {
        let settle_start = std::time::Instant::now();

        let mut payment = Payment::new(
            request.order_id,
            request.user_id,
            request.amount,
            request.status,
        )?;

        match self.settlement.decide() {
            SettlementOutcome::Approved => {
                payment.mark_completed();
                metrics::counter!("payments_completed_total").increment(1);
            }
            SettlementOutcome::Declined => {
                payment.mark_failed();
                metrics::counter!("payments_failed_total").increment(1);
            }
        }

        let payment = self.payments.insert(payment).await?;
        metrics::histogram!("settlement_duration_seconds")
            .record(settle_start.elapsed().as_secs_f64());
        tracing::info!(
            payment_id = %payment.id,
            status = %payment.status,
            amount = %payment.amount,
            "payment settled"
        );

        if let Some(outcome) = payment.outcome() {
            self.notify_order(payment.order_id, outcome, correlation_id)
                .await;
        }

        Ok(payment)
    }

    /// Idempotent manual override: forces the payment to `completed`.
    ///
    /// An already-completed payment is returned unchanged and no second
    /// callback fires.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(
        &self,
        payment_id: PaymentId,
        correlation_id: &CorrelationId,
    ) -> Result<Confirmation> {
        let mut payment = self
            .payments
            .get(payment_id)
            .await?
            .ok_or(SagaError::PaymentNotFound(payment_id))?;

        if payment.status == PaymentStatus::Completed {
            return Ok(Confirmation {
                payment,
                already_completed: true,
            });
        }

        payment.mark_completed();
        let payment = self
            .payments
            .update(payment)
            .await?
            .ok_or(SagaError::PaymentNotFound(payment_id))?;
        tracing::info!(payment_id = %payment.id, "payment force-confirmed");

        self.notify_order(payment.order_id, PaymentOutcome::Confirmed, correlation_id)
            .await;

        Ok(Confirmation {
            payment,
            already_completed: false,
        })
    }

    /// Unconditional status overwrite. Stamps `processed_at` only when the
    /// new status is terminal, and fires no callback.
    ///
    /// Nothing prevents regressing a terminal payment back to `pending`;
    /// the override exists precisely to bypass the normal lifecycle.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        payment_id: PaymentId,
        status: PaymentStatus,
    ) -> Result<Payment> {
        let mut payment = self
            .payments
            .get(payment_id)
            .await?
            .ok_or(SagaError::PaymentNotFound(payment_id))?;

        payment.status = status;
        if status.is_terminal() {
            payment.processed_at = Some(Utc::now());
        }

        self.payments
            .update(payment)
            .await?
            .ok_or(SagaError::PaymentNotFound(payment_id))
    }

    /// Loads a payment by ID.
    pub async fn get_payment(&self, payment_id: PaymentId) -> Result<Payment> {
        self.payments
            .get(payment_id)
            .await?
            .ok_or(SagaError::PaymentNotFound(payment_id))
    }

    /// Lists all payments.
    pub async fn list_payments(&self) -> Result<Vec<Payment>> {
        Ok(self.payments.list().await?)
    }

    /// Lists all payments made by the given user.
    pub async fn payments_for_user(&self, user_id: &UserId) -> Result<Vec<Payment>> {
        Ok(self.payments.list_by_user(user_id).await?)
    }

    /// Pushes a settlement outcome to the order side, bounded by the call
    /// timeout. Failure is logged and counted, never propagated.
    async fn notify_order(
        &self,
        order_id: OrderId,
        outcome: PaymentOutcome,
        correlation_id: &CorrelationId,
    ) {
        let result = tokio::time::timeout(
            self.call_timeout,
            self.callback.notify(order_id, outcome, correlation_id),
        )
        .await;

        let error = match result {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e,
            Err(_) => SagaError::unavailable("order service", "status callback timed out"),
        };

        metrics::counter!("status_callback_failures_total").increment(1);
        tracing::warn!(
            %order_id,
            correlation_id = %correlation_id,
            error = %error,
            "status callback failed; order will not learn the settlement outcome"
        );
    }
}
