//! Checkout and order management.
//!
//! Checkout runs these steps in one unit of work:
//! 1. Resolve the shipping address (existing, inline or default)
//! 2. Read and lock the purchaser's cart
//! 3. Copy cart lines into price-locked order items
//! 4. Build and persist the order
//! 5. Drain the cart
//!
//! If any step fails the unit of work is dropped and nothing is written.
//! The invoice is queued after commit and never affects the order.

pub(crate) mod address;
pub mod coordinator;
pub mod error;
pub mod lifecycle;
mod materialize;

pub use address::AddressService;
pub use coordinator::{CheckoutCoordinator, MAX_ORDER_NUMBER_ATTEMPTS, PlaceOrder};
pub use error::{CheckoutError, Result};
pub use lifecycle::OrderService;
