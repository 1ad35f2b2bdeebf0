//! Cart snapshot types.
//!
//! Carts are owned by the cart service; the order services only read a
//! snapshot and drain it after checkout.

use common::{CartId, CartItemId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::money::{Money, Totals};
use crate::product::Product;

/// A single line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub size: Option<String>,
    pub quantity: u32,
    /// Unit list price.
    pub price: Money,
    /// Unit price after product discount.
    pub discounted_price: Money,
}

impl CartItem {
    /// Creates a line for `quantity` units of `product` at its current prices.
    pub fn for_product(
        user_id: UserId,
        product: &Product,
        quantity: u32,
        size: Option<String>,
    ) -> Self {
        Self {
            id: CartItemId::new(),
            product_id: product.id,
            user_id,
            size,
            quantity,
            price: product.price,
            discounted_price: product.discounted_price,
        }
    }
}

/// A user's cart with its stored totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub totals: Totals,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: CartId::new(),
            user_id,
            items: Vec::new(),
            totals: Totals::zero(),
        }
    }

    /// Appends a line and recalculates the totals.
    pub fn add_item(&mut self, item: CartItem) {
        self.items.push(item);
        self.recalculate();
    }

    /// Recomputes the stored totals from the lines.
    pub fn recalculate(&mut self) {
        let total_price: Money = self.items.iter().map(|i| i.price.multiply(i.quantity)).sum();
        let total_discounted_price: Money = self
            .items
            .iter()
            .map(|i| i.discounted_price.multiply(i.quantity))
            .sum();

        self.totals = Totals {
            total_price,
            total_discounted_price,
            discount: total_price - total_discounted_price,
            total_item: u32::try_from(self.items.len()).unwrap_or(u32::MAX),
        };
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_ids(&self) -> Vec<CartItemId> {
        self.items.iter().map(|i| i.id).collect()
    }

    /// Drops every line and zeroes the totals. The cart itself survives.
    pub fn reset(&mut self) {
        self.items.clear();
        self.totals = Totals::zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: i64, discounted: i64) -> Product {
        Product::new("Shirt", Money::from_rupees(price), Money::from_rupees(discounted))
    }

    #[test]
    fn test_add_item_recalculates_totals() {
        let user_id = UserId::new();
        let mut cart = Cart::new(user_id);

        cart.add_item(CartItem::for_product(user_id, &product(600, 500), 1, None));
        cart.add_item(CartItem::for_product(
            user_id,
            &product(400, 300),
            2,
            Some("M".to_string()),
        ));

        assert_eq!(cart.totals.total_price, Money::from_rupees(1400));
        assert_eq!(cart.totals.total_discounted_price, Money::from_rupees(1100));
        assert_eq!(cart.totals.discount, Money::from_rupees(300));
        assert_eq!(cart.totals.total_item, 2);
    }

    #[test]
    fn test_reset_keeps_identity() {
        let user_id = UserId::new();
        let mut cart = Cart::new(user_id);
        cart.add_item(CartItem::for_product(user_id, &product(10, 10), 1, None));
        let id = cart.id;

        cart.reset();

        assert_eq!(cart.id, id);
        assert!(cart.is_empty());
        assert!(cart.totals.is_zero());
    }
}
