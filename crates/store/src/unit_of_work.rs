use std::collections::HashMap;

use async_trait::async_trait;
use common::{AddressId, CartId, CartItemId, OrderId, OrderItemId, ProductId, UserId};
use domain::{
    Address, Cart, Order, OrderDetails, OrderItem, OrderLine, OrderNumber, Product, User,
};

use crate::Result;

/// Core trait for storage backends.
///
/// A store hands out units of work. Every read and write goes through one,
/// so a multi-entity change commits or rolls back as a whole.
#[async_trait]
pub trait Store: Send + Sync {
    /// The transaction handle this store produces.
    type Uow: UnitOfWork;

    /// Opens a unit of work.
    ///
    /// Dropping the returned handle without calling
    /// [`UnitOfWork::commit`] discards every write made through it.
    async fn begin(&self) -> Result<Self::Uow>;
}

/// A transaction over users, addresses, products, carts and orders.
#[async_trait]
pub trait UnitOfWork: Send {
    // -- Users --

    async fn find_user(&mut self, id: UserId) -> Result<Option<User>>;

    async fn insert_user(&mut self, user: &User) -> Result<()>;

    /// Appends an address to the user's address list.
    async fn link_user_address(&mut self, user_id: UserId, address_id: AddressId) -> Result<()>;

    /// Removes an address from the user's address list.
    async fn unlink_user_address(&mut self, user_id: UserId, address_id: AddressId)
    -> Result<()>;

    // -- Addresses --

    async fn find_address(&mut self, id: AddressId) -> Result<Option<Address>>;

    /// Returns the user's addresses, oldest first.
    async fn addresses_for_user(&mut self, user_id: UserId) -> Result<Vec<Address>>;

    async fn insert_address(&mut self, address: &Address) -> Result<()>;

    /// Marks one address as the user's default and clears the flag on all others.
    async fn set_default_address(&mut self, user_id: UserId, address_id: AddressId) -> Result<()>;

    /// Returns true if a row was deleted.
    async fn delete_address(&mut self, id: AddressId) -> Result<bool>;

    // -- Products --

    async fn insert_product(&mut self, product: &Product) -> Result<()>;

    async fn find_products(&mut self, ids: &[ProductId]) -> Result<Vec<Product>>;

    // -- Carts --

    /// Reads the user's cart and holds it against concurrent checkouts
    /// until this unit of work ends.
    async fn find_cart_for_update(&mut self, user_id: UserId) -> Result<Option<Cart>>;

    /// Inserts or replaces a cart together with all its lines.
    async fn save_cart(&mut self, cart: &Cart) -> Result<()>;

    async fn delete_cart_items(&mut self, ids: &[CartItemId]) -> Result<()>;

    /// Empties the cart and zeroes its totals.
    async fn reset_cart(&mut self, cart_id: CartId) -> Result<()>;

    // -- Orders --

    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<()>;

    /// Returns the requested items in the order of `ids`; unknown ids are skipped.
    async fn find_order_items(&mut self, ids: &[OrderItemId]) -> Result<Vec<OrderItem>>;

    async fn order_number_exists(&mut self, number: &OrderNumber) -> Result<bool>;

    async fn insert_order(&mut self, order: &Order) -> Result<()>;

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>>;

    /// Like [`UnitOfWork::find_order`], but holds the order against
    /// concurrent status changes until this unit of work ends.
    async fn find_order_for_update(&mut self, id: OrderId) -> Result<Option<Order>>;

    /// Persists the order's status and payment status.
    async fn update_order_status(&mut self, order: &Order) -> Result<()>;

    /// Lists orders newest first, optionally for one user only.
    async fn list_orders(&mut self, user_id: Option<UserId>) -> Result<Vec<Order>>;

    /// Deletes an order and its items. Returns true if the order existed.
    async fn delete_order(&mut self, id: OrderId) -> Result<bool>;

    /// Makes every write in this unit of work durable.
    async fn commit(self) -> Result<()>;
}

/// Extension trait providing joined reads.
#[async_trait]
pub trait UnitOfWorkExt: UnitOfWork {
    /// Returns the user's default address, if one is marked.
    async fn default_address(&mut self, user_id: UserId) -> Result<Option<Address>> {
        Ok(self
            .addresses_for_user(user_id)
            .await?
            .into_iter()
            .find(|a| a.is_default))
    }

    /// Resolves an order's items with their products.
    async fn order_lines(&mut self, order: &Order) -> Result<Vec<OrderLine>> {
        let items = self.find_order_items(&order.item_ids).await?;
        let product_ids: Vec<ProductId> = items.iter().map(|i| i.product_id).collect();
        let products: HashMap<ProductId, Product> = self
            .find_products(&product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(items
            .into_iter()
            .map(|item| {
                let product = products.get(&item.product_id).cloned();
                OrderLine { item, product }
            })
            .collect())
    }

    /// Loads an order with its user, lines and shipping address.
    async fn order_details(&mut self, id: OrderId) -> Result<Option<OrderDetails>> {
        let Some(order) = self.find_order(id).await? else {
            return Ok(None);
        };

        let user = self.find_user(order.user_id).await?;
        let lines = self.order_lines(&order).await?;
        let shipping_address = self.find_address(order.shipping_address_id).await?;

        Ok(Some(OrderDetails {
            order,
            user,
            lines,
            shipping_address,
        }))
    }
}

// Blanket implementation for all UnitOfWork implementations
impl<T: UnitOfWork> UnitOfWorkExt for T {}
