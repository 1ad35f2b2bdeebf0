use chrono::{DateTime, Utc};
use common::{AddressId, UserId};
use serde::{Deserialize, Serialize};

/// A storefront account as seen by the order services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub mobile: String,
    /// Addresses the user owns, in creation order.
    pub address_ids: Vec<AddressId>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: Option<String>,
        mobile: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId::new(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email,
            mobile: mobile.into(),
            address_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
