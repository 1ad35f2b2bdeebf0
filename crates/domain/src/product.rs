use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// The catalog fields the order services read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Money,
    pub discounted_price: Money,
}

impl Product {
    pub fn new(title: impl Into<String>, price: Money, discounted_price: Money) -> Self {
        Self {
            id: ProductId::new(),
            title: title.into(),
            price,
            discounted_price,
        }
    }
}
