//! Service seams between the order side, the payment side, and the
//! external restaurant directory.
//!
//! Each seam is an async trait with three implementations: an in-process
//! one for the default single-binary wiring, an HTTP client for split
//! deployment, and an in-memory fake with failure toggles for tests.

pub mod callback;
pub mod gateway;
pub mod restaurant;

pub use callback::{HttpStatusCallback, InMemoryStatusCallback, LocalStatusCallback, StatusCallback};
pub use gateway::{
    HttpPaymentGateway, InMemoryPaymentGateway, InitiatePayment, LocalPaymentGateway,
    PaymentGateway,
};
pub use restaurant::{HttpRestaurantDirectory, InMemoryRestaurantDirectory, RestaurantDirectory};
