//! Order reads, status transitions and deletion.

use common::{OrderId, UserId};
use domain::{Order, OrderDetails, OrderStatus};
use store::{Store, UnitOfWork, UnitOfWorkExt};

use crate::error::{CheckoutError, Result};

/// Service for orders after checkout.
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads an order with its purchaser, lines and shipping address.
    #[tracing::instrument(skip(self))]
    pub async fn find_order(&self, order_id: OrderId) -> Result<OrderDetails> {
        let mut uow = self.store.begin().await?;
        uow.order_details(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))
    }

    /// Returns a user's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn order_history(&self, user_id: UserId) -> Result<Vec<OrderDetails>> {
        self.list(Some(user_id)).await
    }

    /// Returns every order, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<OrderDetails>> {
        self.list(None).await
    }

    async fn list(&self, user_id: Option<UserId>) -> Result<Vec<OrderDetails>> {
        let mut uow = self.store.begin().await?;
        let orders = uow.list_orders(user_id).await?;

        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            let user = uow.find_user(order.user_id).await?;
            let lines = uow.order_lines(&order).await?;
            let shipping_address = uow.find_address(order.shipping_address_id).await?;
            details.push(OrderDetails {
                order,
                user,
                lines,
                shipping_address,
            });
        }
        Ok(details)
    }

    /// Moves a pending order to PLACED and marks its payment completed.
    pub async fn place(&self, order_id: OrderId) -> Result<Order> {
        self.transition(order_id, OrderStatus::Placed).await
    }

    pub async fn confirm(&self, order_id: OrderId) -> Result<Order> {
        self.transition(order_id, OrderStatus::Confirmed).await
    }

    pub async fn ship(&self, order_id: OrderId) -> Result<Order> {
        self.transition(order_id, OrderStatus::Shipped).await
    }

    pub async fn deliver(&self, order_id: OrderId) -> Result<Order> {
        self.transition(order_id, OrderStatus::Delivered).await
    }

    pub async fn cancel(&self, order_id: OrderId) -> Result<Order> {
        self.transition(order_id, OrderStatus::Cancelled).await
    }

    /// Applies a status change under a row lock.
    ///
    /// Repeating the order's current status returns it unchanged without a write.
    #[tracing::instrument(skip(self))]
    pub async fn transition(&self, order_id: OrderId, target: OrderStatus) -> Result<Order> {
        let mut uow = self.store.begin().await?;
        let mut order = uow
            .find_order_for_update(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        let from = order.status;
        if let Err(e) = order.transition(target) {
            metrics::counter!("order_transitions_rejected_total").increment(1);
            tracing::warn!(%from, %target, "order transition rejected");
            return Err(e.into());
        }

        if order.status != from {
            uow.update_order_status(&order).await?;
            uow.commit().await?;
            metrics::counter!("order_transitions_total", "status" => target.as_str())
                .increment(1);
            tracing::info!(%from, %target, "order status changed");
        }
        Ok(order)
    }

    /// Deletes an order together with its items.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, order_id: OrderId) -> Result<()> {
        let mut uow = self.store.begin().await?;
        if !uow.delete_order(order_id).await? {
            return Err(CheckoutError::OrderNotFound(order_id));
        }
        uow.commit().await?;
        metrics::counter!("orders_deleted_total").increment(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{NewOrder, OrderError, PaymentStatus, Totals};
    use store::InMemoryStore;

    async fn seeded() -> (OrderService<InMemoryStore>, Order) {
        let store = InMemoryStore::new();
        let order = NewOrder::new(UserId::new(), common::AddressId::new(), vec![], Totals::zero())
            .build(Utc::now());
        let mut uow = store.begin().await.unwrap();
        uow.insert_order(&order).await.unwrap();
        uow.commit().await.unwrap();
        (OrderService::new(store), order)
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let (service, order) = seeded().await;

        let placed = service.place(order.id).await.unwrap();
        assert_eq!(placed.payment.status, PaymentStatus::Completed);
        service.confirm(order.id).await.unwrap();
        service.ship(order.id).await.unwrap();
        let delivered = service.deliver(order.id).await.unwrap();

        assert_eq!(delivered.status, OrderStatus::Delivered);
        let stored = service.find_order(order.id).await.unwrap();
        assert_eq!(stored.order.status, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn skipping_a_step_is_rejected() {
        let (service, order) = seeded().await;

        let err = service.ship(order.id).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Order(OrderError::InvalidStateTransition {
                current: OrderStatus::Pending,
                target: OrderStatus::Shipped,
            })
        ));
        assert_eq!(
            service.find_order(order.id).await.unwrap().order.status,
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn repeated_transition_is_idempotent() {
        let (service, order) = seeded().await;

        service.place(order.id).await.unwrap();
        let again = service.place(order.id).await.unwrap();
        assert_eq!(again.status, OrderStatus::Placed);
    }

    #[tokio::test]
    async fn cancel_while_pending() {
        let (service, order) = seeded().await;

        let cancelled = service.cancel(order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancel_after_placing_is_rejected() {
        let (service, order) = seeded().await;
        service.place(order.id).await.unwrap();

        let err = service.cancel(order.id).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Order(OrderError::InvalidStateTransition {
                current: OrderStatus::Placed,
                target: OrderStatus::Cancelled,
            })
        ));

        service.confirm(order.id).await.unwrap();
        let err = service.cancel(order.id).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Order(OrderError::InvalidStateTransition {
                current: OrderStatus::Confirmed,
                target: OrderStatus::Cancelled,
            })
        ));
        assert_eq!(
            service.find_order(order.id).await.unwrap().order.status,
            OrderStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let (service, _) = seeded().await;
        let missing = OrderId::new();

        assert!(matches!(
            service.place(missing).await,
            Err(CheckoutError::OrderNotFound(_))
        ));
        assert!(matches!(
            service.delete(missing).await,
            Err(CheckoutError::OrderNotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_order() {
        let (service, order) = seeded().await;

        service.delete(order.id).await.unwrap();
        assert!(matches!(
            service.find_order(order.id).await,
            Err(CheckoutError::OrderNotFound(_))
        ));
    }
}
