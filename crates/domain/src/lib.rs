//! Domain layer for the storefront order services.
//!
//! This crate provides the entities the checkout workflow reads and writes:
//! - Users, products, carts and addresses (inputs owned by other services)
//! - Orders and price-locked order items
//! - The order status state machine and order-number rules
//! - Money in minor units and cart/order totals

pub mod address;
pub mod cart;
pub mod money;
pub mod order;
pub mod product;
pub mod user;

pub use address::{Address, NewAddress, ShippingAddress};
pub use cart::{Cart, CartItem};
pub use money::{Money, Totals};
pub use order::{
    DELIVERY_WINDOW_DAYS, NewOrder, Order, OrderDetails, OrderError, OrderItem, OrderLine,
    OrderNumber, OrderStatus, PaymentDetails, PaymentStatus, UnknownStatus,
    default_delivery_date,
};
pub use product::Product;
pub use user::User;

pub use validator::{Validate, ValidationErrors};
