//! Saga error types.

use common::{OrderId, PaymentId};
use domain::{DomainError, RestaurantId};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during saga operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Malformed or missing input.
    #[error("validation failed: {0}")]
    Validation(#[from] DomainError),

    /// Order not found.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// Payment not found.
    #[error("payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// Restaurant does not resolve against the directory. Also covers an
    /// unreachable directory: existence cannot be established, so the
    /// order is rejected (fail closed).
    #[error("restaurant not found: {0}")]
    RestaurantNotFound(RestaurantId),

    /// A downstream service is unreachable or timed out.
    #[error("{service} unavailable: {reason}")]
    DownstreamUnavailable {
        service: &'static str,
        reason: String,
    },

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A partial update named no fields to change.
    #[error("no status or deliveryStatus provided")]
    EmptyUpdate,
}

impl SagaError {
    /// Builds a downstream-unavailable error for the named service.
    pub fn unavailable(service: &'static str, reason: impl ToString) -> Self {
        SagaError::DownstreamUnavailable {
            service,
            reason: reason.to_string(),
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
