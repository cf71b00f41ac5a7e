//! Route handlers.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;

use std::sync::Arc;

use saga::{OrderCoordinator, PaymentProcessor};
use store::{OrderStore, PaymentStore};

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore, P: PaymentStore> {
    pub coordinator: OrderCoordinator<S>,
    pub processor: Arc<PaymentProcessor<P>>,
}
