use chrono::{DateTime, Utc};
use common::{OrderItemId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::money::Money;

/// A price-locked copy of a cart line, taken at checkout.
///
/// Order history reads these, never the live product prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub size: Option<String>,
    pub quantity: u32,
    /// Unit list price at purchase time.
    pub price: Money,
    /// Unit discounted price at purchase time.
    pub discounted_price: Money,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn from_cart_item(item: &CartItem) -> Self {
        Self {
            id: OrderItemId::new(),
            user_id: item.user_id,
            product_id: item.product_id,
            size: item.size.clone(),
            quantity: item.quantity,
            price: item.price,
            discounted_price: item.discounted_price,
            created_at: Utc::now(),
        }
    }

    /// Discounted price times quantity.
    pub fn line_total(&self) -> Money {
        self.discounted_price.multiply(self.quantity)
    }
}
