//! Identifier types shared by every storefront order crate.

mod types;

pub use types::{AddressId, CartId, CartItemId, OrderId, OrderItemId, ProductId, UserId};
