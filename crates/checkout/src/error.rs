//! Checkout error types.

use common::{AddressId, OrderId, UserId};
use domain::{OrderError, ValidationErrors};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur in checkout, address and order operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request payload failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// User not found.
    #[error("User not found with id: {0}")]
    UserNotFound(UserId),

    /// Address not found.
    #[error("Address not found with id: {0}")]
    AddressNotFound(AddressId),

    /// Checkout without an address payload and no default address on file.
    #[error("No default address found")]
    NoDefaultAddress,

    /// The address belongs to another user.
    #[error("You don't have permission to modify address {0}")]
    PermissionDenied(AddressId),

    /// Order not found.
    #[error("Order not found with id: {0}")]
    OrderNotFound(OrderId),

    /// The purchaser's cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// The checkout transaction failed and was rolled back.
    #[error("Order creation failed. Please try again.")]
    OrderCreationFailed,

    /// Order rule violation.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
