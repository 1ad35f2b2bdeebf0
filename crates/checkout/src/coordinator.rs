//! Checkout coordinator: turns a purchaser's cart into an order.

use std::time::Instant;

use chrono::{DateTime, Utc};
use common::UserId;
use domain::{NewOrder, Order, OrderNumber, ShippingAddress};
use invoice::InvoiceDispatcher;
use store::{Store, StoreError, UnitOfWork};

use crate::address::resolve_shipping_address;
use crate::error::{CheckoutError, Result};
use crate::materialize::{drain_cart, materialize_items};

/// Order numbers drawn before checkout gives up on finding a free one.
pub const MAX_ORDER_NUMBER_ATTEMPTS: usize = 5;

/// A request to check out the purchaser's cart.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub user_id: UserId,
    /// Existing address reference or inline fields; `None` uses the default address.
    pub shipping_address: Option<ShippingAddress>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
}

impl PlaceOrder {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            shipping_address: None,
            delivery_date: None,
            payment_method: None,
        }
    }

    pub fn with_shipping_address(mut self, address: ShippingAddress) -> Self {
        self.shipping_address = Some(address);
        self
    }

    pub fn with_delivery_date(mut self, date: DateTime<Utc>) -> Self {
        self.delivery_date = Some(date);
        self
    }

    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }
}

/// Runs checkouts.
///
/// Every step from address resolution to cart reset shares one unit of
/// work. The invoice is queued only after that unit of work commits.
pub struct CheckoutCoordinator<S: Store> {
    store: S,
    invoices: InvoiceDispatcher,
}

impl<S: Store> CheckoutCoordinator<S> {
    pub fn new(store: S, invoices: InvoiceDispatcher) -> Self {
        Self { store, invoices }
    }

    /// Places an order from the purchaser's current cart.
    ///
    /// Validation, unknown purchaser, empty cart and missing default address
    /// are reported as such. Any other failure rolls everything back and
    /// surfaces as [`CheckoutError::OrderCreationFailed`].
    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user_id))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let start = Instant::now();

        if let Some(address) = &cmd.shipping_address {
            address.validate()?;
        }
        {
            let mut uow = self.store.begin().await?;
            if uow.find_user(cmd.user_id).await?.is_none() {
                return Err(CheckoutError::UserNotFound(cmd.user_id));
            }
        }

        let order = match self.create_order(cmd).await {
            Ok(order) => order,
            Err(e @ (CheckoutError::EmptyCart | CheckoutError::NoDefaultAddress)) => {
                metrics::counter!("checkout_rejected_total").increment(1);
                tracing::info!(reason = %e, "checkout rejected");
                return Err(e);
            }
            Err(e) => {
                metrics::counter!("checkout_failed_total").increment(1);
                tracing::error!(error = %e, "order creation failed, transaction rolled back");
                return Err(CheckoutError::OrderCreationFailed);
            }
        };

        self.invoices.enqueue(order.id);

        let duration = start.elapsed().as_secs_f64();
        metrics::histogram!("checkout_duration_seconds").record(duration);
        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            duration,
            "order placed"
        );

        Ok(order)
    }

    async fn create_order(&self, cmd: PlaceOrder) -> Result<Order> {
        let mut uow = self.store.begin().await?;

        let address = resolve_shipping_address(&mut uow, cmd.user_id, cmd.shipping_address).await?;

        let cart = match uow.find_cart_for_update(cmd.user_id).await? {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Err(CheckoutError::EmptyCart),
        };

        let items = materialize_items(&mut uow, &cart).await?;

        let order_date = Utc::now();
        let order_number = unique_order_number(&mut uow, order_date).await?;
        let order = NewOrder::new(
            cmd.user_id,
            address.id,
            items.iter().map(|i| i.id).collect(),
            cart.totals,
        )
        .with_order_number(order_number)
        .with_delivery_date(cmd.delivery_date)
        .with_payment_method(cmd.payment_method)
        .build(order_date);

        uow.insert_order(&order).await?;
        drain_cart(&mut uow, &cart).await?;
        uow.commit().await?;

        Ok(order)
    }
}

async fn unique_order_number<U: UnitOfWork>(
    uow: &mut U,
    order_date: DateTime<Utc>,
) -> std::result::Result<OrderNumber, StoreError> {
    for _ in 0..MAX_ORDER_NUMBER_ATTEMPTS {
        let candidate = OrderNumber::generate(order_date.date_naive(), &mut rand::rng());
        if !uow.order_number_exists(&candidate).await? {
            return Ok(candidate);
        }
        tracing::debug!(%candidate, "order number taken, drawing another");
    }
    Err(StoreError::Conflict(format!(
        "no free order number after {MAX_ORDER_NUMBER_ATTEMPTS} attempts"
    )))
}
