use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::product::Product;
use crate::user::User;

use super::{Order, OrderItem};

/// An order line with its product resolved.
///
/// `product` is `None` when the product has since been removed from the
/// catalog; the price-locked line still stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item: OrderItem,
    pub product: Option<Product>,
}

impl OrderLine {
    pub fn title(&self) -> &str {
        self.product
            .as_ref()
            .map_or("Unavailable product", |p| p.title.as_str())
    }
}

/// An order with every reference resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub user: Option<User>,
    pub lines: Vec<OrderLine>,
    pub shipping_address: Option<Address>,
}
