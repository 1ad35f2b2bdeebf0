use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Identifier of a storefront user (the purchaser).
    UserId
);

uuid_id!(
    /// Identifier of a saved postal address.
    AddressId
);

uuid_id!(
    /// Identifier of a catalog product.
    ProductId
);

uuid_id!(
    /// Identifier of a user's cart.
    CartId
);

uuid_id!(
    /// Identifier of a single cart line.
    CartItemId
);

uuid_id!(
    /// Identifier of a placed order.
    OrderId
);

uuid_id!(
    /// Identifier of a price-locked order line.
    OrderItemId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_unique_ids() {
        let id1 = OrderId::new();
        let id2 = OrderId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = UserId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
        assert_eq!(Uuid::from(id), uuid);
    }

    #[test]
    fn parses_from_string() {
        let uuid = Uuid::new_v4();
        let id: AddressId = uuid.to_string().parse().unwrap();
        assert_eq!(id.as_uuid(), uuid);
        assert!("not-a-uuid".parse::<AddressId>().is_err());
    }

    #[test]
    fn serializes_as_bare_uuid() {
        let id = CartItemId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
        let back: CartItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
