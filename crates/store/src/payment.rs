//! Payment store trait.

use async_trait::async_trait;
use common::PaymentId;
use domain::{Payment, UserId};

use crate::error::Result;

/// Persistence operations over payment records.
///
/// Payments are never deleted; mutation happens through whole-record
/// replacement of a single document.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persists a new payment and returns it.
    async fn insert(&self, payment: Payment) -> Result<Payment>;

    /// Loads a payment by ID.
    async fn get(&self, id: PaymentId) -> Result<Option<Payment>>;

    /// Lists all payments, oldest first.
    async fn list(&self) -> Result<Vec<Payment>>;

    /// Lists all payments made by the given user, oldest first.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Payment>>;

    /// Replaces an existing payment record and returns the stored value,
    /// or `None` if no payment matched.
    async fn update(&self, payment: Payment) -> Result<Option<Payment>>;
}
