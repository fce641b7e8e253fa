//! Commerce error types.

use thiserror::Error;

use crate::ids::{CartId, LineItemId};

/// Errors that can occur in e-commerce operations.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Cart not found.
    #[error("Cart not found: {0}")]
    CartNotFound(CartId),

    /// Line item not in cart.
    #[error("Line item not in cart: {0}")]
    LineItemNotFound(LineItemId),

    /// Cart data that cannot be classified into paid and gift items.
    #[error("Malformed cart: {0}")]
    MalformedCart(String),

    /// Platform payload failed schema validation.
    #[error("Invalid platform response: {0}")]
    InvalidResponse(String),

    /// Platform reported errors for a request.
    #[error("Platform error: {0}")]
    Platform(String),

    /// Outbound call failed.
    #[error("Fetch error: {0}")]
    Fetch(#[from] turbo_data::FetchError),

    /// An outbound call did not finish within its budget.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// Cache invalidation failed.
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::InvalidResponse(e.to_string())
    }
}

impl CommerceError {
    /// Build a timeout error for a named operation.
    pub fn timeout(operation: &'static str, timeout: std::time::Duration) -> Self {
        CommerceError::Timeout {
            operation,
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}
