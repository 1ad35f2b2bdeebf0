//! Invoice error types.

use common::OrderId;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while producing or fetching an invoice.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order's purchaser could not be loaded.
    #[error("User for order {0} not found")]
    MissingUser(OrderId),

    /// The order's shipping address could not be loaded.
    #[error("Shipping address for order {0} not found")]
    MissingAddress(OrderId),

    /// PDF rendering failed.
    #[error("Render error: {0}")]
    Render(String),

    /// Reading or writing the invoice file failed.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience type alias for invoice results.
pub type Result<T> = std::result::Result<T, InvoiceError>;
