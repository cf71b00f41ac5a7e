//! Persistence seams for order and payment records.
//!
//! Each service owns exactly one store; the other service never writes into
//! it directly. The traits model a document store's atomic single-record
//! operations: update methods return the record as it exists after the
//! update, or `None` when no record matched. Cross-record consistency is
//! the saga's problem, not the store's.

pub mod error;
pub mod memory;
pub mod order;
pub mod payment;

pub use error::{Result, StoreError};
pub use memory::{InMemoryOrderStore, InMemoryPaymentStore};
pub use order::{OrderStatusUpdate, OrderStore};
pub use payment::PaymentStore;
