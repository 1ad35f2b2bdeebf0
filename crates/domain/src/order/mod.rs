//! Orders, order lines and the order status state machine.

mod aggregate;
mod details;
mod item;
mod number;
mod state;

pub use aggregate::{DELIVERY_WINDOW_DAYS, NewOrder, Order, PaymentDetails, default_delivery_date};
pub use details::{OrderDetails, OrderLine};
pub use item::OrderItem;
pub use number::OrderNumber;
pub use state::{OrderStatus, PaymentStatus, UnknownStatus};

use thiserror::Error;

/// Errors raised by order rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The order's current status does not allow the requested move.
    #[error("Invalid state transition: cannot move order from {current} to {target}")]
    InvalidStateTransition {
        current: OrderStatus,
        target: OrderStatus,
    },

    /// A string that is not a well-formed order number.
    #[error("Invalid order number: {0}")]
    InvalidOrderNumber(String),
}
