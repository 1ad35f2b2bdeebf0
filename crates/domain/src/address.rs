//! Postal addresses and the shipping-address payload accepted at checkout.

use chrono::{DateTime, Utc};
use common::{AddressId, UserId};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// A saved address. At most one address per user has `is_default` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub mobile: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// Builds a new address owned by `user_id` from validated fields.
    pub fn create(user_id: UserId, fields: NewAddress, is_default: bool) -> Self {
        Self {
            id: AddressId::new(),
            user_id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            street_address: fields.street_address,
            city: fields.city,
            state: fields.state,
            zip_code: fields.zip_code,
            mobile: fields.mobile,
            is_default,
            created_at: Utc::now(),
        }
    }

    /// Single-line form used on invoices: `street, city, state - zip`.
    pub fn one_line(&self) -> String {
        format!(
            "{}, {}, {} - {}",
            self.street_address, self.city, self.state, self.zip_code
        )
    }
}

/// Inline address fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewAddress {
    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "street address is required"))]
    pub street_address: String,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "state is required"))]
    pub state: String,
    #[validate(length(min = 1, max = 12, message = "zip code is required"))]
    pub zip_code: String,
    #[validate(length(equal = 10, message = "mobile must have 10 digits"))]
    pub mobile: Option<String>,
    /// Ask for the new address to become the user's default.
    #[serde(default)]
    pub is_default: bool,
}

/// Where an order ships to: an address the purchaser already has, or fields
/// for a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShippingAddress {
    Existing {
        #[serde(alias = "_id")]
        id: AddressId,
    },
    New(NewAddress),
}

impl ShippingAddress {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            ShippingAddress::Existing { .. } => Ok(()),
            ShippingAddress::New(fields) => fields.validate(),
        }
    }
}
