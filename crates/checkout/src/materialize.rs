//! Cart-to-order steps run inside the checkout unit of work.

use domain::{Cart, OrderItem};
use store::{StoreError, UnitOfWork};

/// Copies every cart line into a persisted, price-locked order item.
pub(crate) async fn materialize_items<U: UnitOfWork>(
    uow: &mut U,
    cart: &Cart,
) -> Result<Vec<OrderItem>, StoreError> {
    let mut items = Vec::with_capacity(cart.items.len());
    for line in &cart.items {
        let item = OrderItem::from_cart_item(line);
        uow.insert_order_item(&item).await?;
        items.push(item);
    }
    Ok(items)
}

/// Deletes the consumed cart lines and zeroes the cart's totals.
pub(crate) async fn drain_cart<U: UnitOfWork>(uow: &mut U, cart: &Cart) -> Result<(), StoreError> {
    uow.delete_cart_items(&cart.item_ids()).await?;
    uow.reset_cart(cart.id).await
}
