//! Shared identifier types used across the order and payment services.

pub mod types;

pub use types::{CorrelationId, OrderId, PaymentId};
