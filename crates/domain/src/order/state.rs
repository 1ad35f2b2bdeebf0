//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► Placed ──► Confirmed ──► Shipped ──► Delivered
///    │
///    └──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created at checkout, awaiting payment.
    #[default]
    Pending,

    /// Payment received.
    Placed,

    /// Accepted by the seller.
    Confirmed,

    /// Handed to the carrier.
    Shipped,

    /// Received by the purchaser (terminal state).
    Delivered,

    /// Abandoned before shipping (terminal state).
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Placed,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// States an order may be in immediately before entering `self`.
    pub fn allowed_predecessors(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[],
            OrderStatus::Placed => &[OrderStatus::Pending],
            OrderStatus::Confirmed => &[OrderStatus::Placed],
            OrderStatus::Shipped => &[OrderStatus::Confirmed],
            OrderStatus::Delivered => &[OrderStatus::Shipped],
            OrderStatus::Cancelled => &[OrderStatus::Pending],
        }
    }

    /// Returns true if an order in this state may move to `target`.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        target.allowed_predecessors().contains(self)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Placed => "PLACED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Payment progress recorded on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "COMPLETED" => Ok(PaymentStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A stored status string that names no known state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);
