//! Order-payment saga.
//!
//! Coordinates an order's lifecycle across two independently-owned
//! services without a global transaction:
//!
//! 1. The order coordinator validates the request against the restaurant
//!    directory and persists the order as `pending`.
//! 2. It hands `{orderId, userId, amount}` to the payment processor.
//! 3. The processor settles the payment, persists the terminal record, and
//!    pushes the outcome back through the status callback channel.
//! 4. The coordinator applies the outcome, moving the order to `confirmed`
//!    or `payment_failed`.
//!
//! Cross-service notifications are best-effort: a failed handoff leaves the
//! order `pending` forever, and a failed callback leaves the order and the
//! payment permanently divergent. Both failures are logged and counted,
//! never retried or compensated.

pub mod audit;
pub mod coordinator;
pub mod error;
pub mod processor;
pub mod services;
pub mod settlement;

pub use audit::{AuditLevel, AuditPublisher, AuditRecord, InMemoryAuditPublisher, LogAuditPublisher};
pub use coordinator::{OrderCoordinator, OrderStatusView};
pub use error::SagaError;
pub use processor::{Confirmation, PaymentProcessor};
pub use services::{
    HttpPaymentGateway, HttpRestaurantDirectory, HttpStatusCallback, InMemoryPaymentGateway,
    InMemoryRestaurantDirectory, InMemoryStatusCallback, InitiatePayment, LocalPaymentGateway,
    LocalStatusCallback, PaymentGateway, RestaurantDirectory, StatusCallback,
};
pub use settlement::{FixedSettlement, RandomSettlement, SettlementOutcome, SettlementStrategy};
