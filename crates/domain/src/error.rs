//! Domain validation errors.

use thiserror::Error;

/// Errors raised when a record fails creation-time validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// A required field is missing or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// An order must contain at least one item.
    #[error("order has no items")]
    NoItems,

    /// Item quantities must be at least one.
    #[error("invalid quantity for item {item_id}")]
    InvalidQuantity { item_id: String },

    /// Item prices must not be negative.
    #[error("negative price for item {item_id}")]
    NegativePrice { item_id: String },

    /// Payment amounts must be positive.
    #[error("payment amount must be positive")]
    NonPositiveAmount,
}
