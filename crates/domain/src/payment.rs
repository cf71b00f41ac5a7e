//! Payment record and settlement status.

use chrono::{DateTime, Utc};
use common::{OrderId, PaymentId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::order::PaymentOutcome;
use crate::value_objects::{Money, UserId};

/// Settlement status of a payment.
///
/// Once `completed` or `failed` the record is, by policy, immutable,
/// except through the explicit status-override operation, which performs
/// an unconditional overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    /// Returns true if this is a terminal settlement status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }

    /// Returns the status name as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted payment record, linked to exactly one order by a weak
/// reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub user_id: UserId,
    /// Copied from the order's total at initiation, never recomputed.
    pub amount: Money,
    pub status: PaymentStatus,
    pub payment_method: String,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Validates the input and builds a new payment record.
    ///
    /// The transaction ID is an opaque token; the payment method is the
    /// simulated default.
    pub fn new(
        order_id: OrderId,
        user_id: UserId,
        amount: Money,
        initial_status: Option<PaymentStatus>,
    ) -> Result<Self, DomainError> {
        if user_id.is_blank() {
            return Err(DomainError::MissingField("userId"));
        }
        if !amount.is_positive() {
            return Err(DomainError::NonPositiveAmount);
        }

        Ok(Self {
            id: PaymentId::new(),
            order_id,
            user_id,
            amount,
            status: initial_status.unwrap_or_default(),
            payment_method: "credit_card".to_string(),
            transaction_id: generate_transaction_id(),
            created_at: Utc::now(),
            processed_at: None,
        })
    }

    /// Marks the payment settled successfully and stamps `processed_at`.
    pub fn mark_completed(&mut self) {
        self.status = PaymentStatus::Completed;
        self.processed_at = Some(Utc::now());
    }

    /// Marks the payment settlement as failed and stamps `processed_at`.
    pub fn mark_failed(&mut self) {
        self.status = PaymentStatus::Failed;
        self.processed_at = Some(Utc::now());
    }

    /// Maps the settlement status to the outcome reported to the order
    /// side. `None` while the payment is still pending.
    pub fn outcome(&self) -> Option<PaymentOutcome> {
        match self.status {
            PaymentStatus::Completed => Some(PaymentOutcome::Confirmed),
            PaymentStatus::Failed => Some(PaymentOutcome::PaymentFailed),
            PaymentStatus::Pending => None,
        }
    }
}

fn generate_transaction_id() -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("txn_{}", &token[..9])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payment() -> Payment {
        Payment::new(OrderId::new(), "u1".into(), Money::from_cents(2000), None).unwrap()
    }

    #[test]
    fn test_new_payment_defaults() {
        let payment = sample_payment();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.payment_method, "credit_card");
        assert!(payment.transaction_id.starts_with("txn_"));
        assert!(payment.processed_at.is_none());
    }

    #[test]
    fn test_new_payment_respects_requested_status() {
        let payment = Payment::new(
            OrderId::new(),
            "u1".into(),
            Money::from_cents(100),
            Some(PaymentStatus::Completed),
        )
        .unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
    }

    #[test]
    fn test_new_payment_rejects_zero_amount() {
        let result = Payment::new(OrderId::new(), "u1".into(), Money::zero(), None);
        assert_eq!(result.unwrap_err(), DomainError::NonPositiveAmount);
    }

    #[test]
    fn test_new_payment_rejects_blank_user() {
        let result = Payment::new(OrderId::new(), "".into(), Money::from_cents(100), None);
        assert_eq!(result.unwrap_err(), DomainError::MissingField("userId"));
    }

    #[test]
    fn test_mark_completed_stamps_processed_at() {
        let mut payment = sample_payment();
        payment.mark_completed();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert!(payment.processed_at.is_some());
        assert_eq!(payment.outcome(), Some(PaymentOutcome::Confirmed));
    }

    #[test]
    fn test_mark_failed_stamps_processed_at() {
        let mut payment = sample_payment();
        payment.mark_failed();
        assert_eq!(payment.status, PaymentStatus::Failed);
        assert!(payment.processed_at.is_some());
        assert_eq!(payment.outcome(), Some(PaymentOutcome::PaymentFailed));
    }

    #[test]
    fn test_pending_payment_has_no_outcome() {
        assert_eq!(sample_payment().outcome(), None);
    }

    #[test]
    fn test_transaction_ids_are_unique() {
        assert_ne!(sample_payment().transaction_id, sample_payment().transaction_id);
    }

    #[test]
    fn test_payment_wire_shape() {
        let payment = sample_payment();
        let json = serde_json::to_value(&payment).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["amount"], 2000);
        assert_eq!(json["status"], "pending");
        assert_eq!(json["paymentMethod"], "credit_card");
        assert_eq!(json["processedAt"], serde_json::Value::Null);
    }

    #[test]
    fn test_status_wire_strings() {
        assert_eq!(PaymentStatus::Pending.to_string(), "pending");
        assert_eq!(PaymentStatus::Completed.to_string(), "completed");
        assert_eq!(PaymentStatus::Failed.to_string(), "failed");
        assert!(PaymentStatus::Completed.is_terminal());
        assert!(!PaymentStatus::Pending.is_terminal());
    }
}
