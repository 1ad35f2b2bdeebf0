//! Order record and its construction from a checkout.

use chrono::{DateTime, Duration, Utc};
use common::{AddressId, OrderId, OrderItemId, UserId};
use serde::{Deserialize, Serialize};

use crate::money::Totals;

use super::{OrderError, OrderNumber, OrderStatus, PaymentStatus};

/// Days between order date and the default delivery date.
pub const DELIVERY_WINDOW_DAYS: i64 = 7;

/// Returns the delivery date used when none is given.
pub fn default_delivery_date(order_date: DateTime<Utc>) -> DateTime<Utc> {
    order_date + Duration::days(DELIVERY_WINDOW_DAYS)
}

/// Payment sub-record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub payment_id: Option<String>,
    pub status: PaymentStatus,
}

/// A completed checkout.
///
/// Everything except `status` and `payment.status` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub user_id: UserId,
    /// Order lines, in cart order.
    pub item_ids: Vec<OrderItemId>,
    pub shipping_address_id: AddressId,
    pub order_date: DateTime<Utc>,
    pub delivery_date: DateTime<Utc>,
    pub payment: PaymentDetails,
    pub totals: Totals,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Moves the order to `target`.
    ///
    /// Returns `Ok(false)` without touching anything when the order is already
    /// in `target`. Entering [`OrderStatus::Placed`] completes the payment.
    pub fn transition(&mut self, target: OrderStatus) -> Result<bool, OrderError> {
        if self.status == target {
            return Ok(false);
        }
        if !self.status.can_transition_to(target) {
            return Err(OrderError::InvalidStateTransition {
                current: self.status,
                target,
            });
        }

        self.status = target;
        if target == OrderStatus::Placed {
            self.payment.status = PaymentStatus::Completed;
        }
        Ok(true)
    }
}

/// Inputs for a new order. Optional fields are filled in by [`NewOrder::build`].
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub shipping_address_id: AddressId,
    pub item_ids: Vec<OrderItemId>,
    pub totals: Totals,
    pub order_number: Option<OrderNumber>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
}

impl NewOrder {
    pub fn new(
        user_id: UserId,
        shipping_address_id: AddressId,
        item_ids: Vec<OrderItemId>,
        totals: Totals,
    ) -> Self {
        Self {
            user_id,
            shipping_address_id,
            item_ids,
            totals,
            order_number: None,
            delivery_date: None,
            payment_method: None,
        }
    }

    pub fn with_order_number(mut self, number: OrderNumber) -> Self {
        self.order_number = Some(number);
        self
    }

    pub fn with_delivery_date(mut self, date: Option<DateTime<Utc>>) -> Self {
        self.delivery_date = date;
        self
    }

    pub fn with_payment_method(mut self, method: Option<String>) -> Self {
        self.payment_method = method;
        self
    }

    /// Builds a `PENDING` order dated `order_date`, assigning an order number
    /// and delivery date if absent.
    pub fn build(self, order_date: DateTime<Utc>) -> Order {
        let order_number = self
            .order_number
            .unwrap_or_else(|| OrderNumber::generate(order_date.date_naive(), &mut rand::rng()));
        let delivery_date = self
            .delivery_date
            .unwrap_or_else(|| default_delivery_date(order_date));

        Order {
            id: OrderId::new(),
            order_number,
            user_id: self.user_id,
            item_ids: self.item_ids,
            shipping_address_id: self.shipping_address_id,
            order_date,
            delivery_date,
            payment: PaymentDetails {
                payment_method: self.payment_method,
                status: PaymentStatus::Pending,
                ..PaymentDetails::default()
            },
            totals: self.totals,
            status: OrderStatus::Pending,
            created_at: order_date,
        }
    }
}
