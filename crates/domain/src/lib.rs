//! Data model shared by the order and payment services.
//!
//! Orders and payments are plain persisted records, each exclusively owned
//! and mutated by its home service. The types here carry the validation
//! rules applied at creation time and the status enums whose wire strings
//! both services exchange.

pub mod error;
pub mod order;
pub mod payment;
pub mod value_objects;

pub use error::DomainError;
pub use order::{DeliveryStatus, Order, OrderStatus, PaymentOutcome};
pub use payment::{Payment, PaymentStatus};
pub use value_objects::{MenuItemId, Money, OrderItem, RestaurantId, UserId};
