//! Store error types.

use thiserror::Error;

/// Errors raised by a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store is unreachable or rejected the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
