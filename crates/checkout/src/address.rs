//! Address book operations and shipping-address resolution.

use common::{AddressId, UserId};
use domain::{Address, NewAddress, ShippingAddress, Validate};
use store::{Store, StoreError, UnitOfWork, UnitOfWorkExt};

use crate::error::{CheckoutError, Result};

/// Persists a new address for `user_id` inside an open unit of work.
///
/// The user's first address always becomes the default. A later address
/// becomes the default only when asked, and then clears every other default.
pub(crate) async fn create_address<U: UnitOfWork>(
    uow: &mut U,
    user_id: UserId,
    fields: NewAddress,
) -> std::result::Result<Address, StoreError> {
    let has_addresses = !uow.addresses_for_user(user_id).await?.is_empty();
    let is_default = !has_addresses || fields.is_default;

    let address = Address::create(user_id, fields, is_default);
    uow.insert_address(&address).await?;
    if is_default {
        uow.set_default_address(user_id, address.id).await?;
    }
    uow.link_user_address(user_id, address.id).await?;
    Ok(address)
}

/// Turns a checkout's shipping payload into a persisted address.
///
/// An existing id is used as-is. Inline fields create a new address. No
/// payload falls back to the purchaser's default address.
pub(crate) async fn resolve_shipping_address<U: UnitOfWork>(
    uow: &mut U,
    user_id: UserId,
    payload: Option<ShippingAddress>,
) -> Result<Address> {
    match payload {
        Some(ShippingAddress::Existing { id }) => uow
            .find_address(id)
            .await?
            .ok_or(CheckoutError::AddressNotFound(id)),
        Some(ShippingAddress::New(fields)) => Ok(create_address(uow, user_id, fields).await?),
        None => uow
            .default_address(user_id)
            .await?
            .ok_or(CheckoutError::NoDefaultAddress),
    }
}

/// Service for a user's saved addresses.
pub struct AddressService<S: Store> {
    store: S,
}

impl<S: Store> AddressService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates an address for an existing user.
    #[tracing::instrument(skip(self, fields))]
    pub async fn create(&self, user_id: UserId, fields: NewAddress) -> Result<Address> {
        fields.validate()?;

        let mut uow = self.store.begin().await?;
        if uow.find_user(user_id).await?.is_none() {
            return Err(CheckoutError::UserNotFound(user_id));
        }
        let address = create_address(&mut uow, user_id, fields).await?;
        uow.commit().await?;

        tracing::info!(
            address_id = %address.id,
            is_default = address.is_default,
            "address created"
        );
        Ok(address)
    }

    /// Lists a user's addresses, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>> {
        let mut uow = self.store.begin().await?;
        if uow.find_user(user_id).await?.is_none() {
            return Err(CheckoutError::UserNotFound(user_id));
        }
        Ok(uow.addresses_for_user(user_id).await?)
    }

    /// Returns the user's default address.
    #[tracing::instrument(skip(self))]
    pub async fn default_address(&self, user_id: UserId) -> Result<Address> {
        let mut uow = self.store.begin().await?;
        uow.default_address(user_id)
            .await?
            .ok_or(CheckoutError::NoDefaultAddress)
    }

    /// Marks one of the user's addresses as default.
    #[tracing::instrument(skip(self))]
    pub async fn set_default(&self, user_id: UserId, address_id: AddressId) -> Result<Address> {
        let mut uow = self.store.begin().await?;
        let mut address = owned_address(&mut uow, user_id, address_id).await?;

        uow.set_default_address(user_id, address_id).await?;
        uow.commit().await?;

        address.is_default = true;
        Ok(address)
    }

    /// Deletes one of the user's addresses and returns it.
    ///
    /// If it was the default, the most recently created remaining address
    /// becomes the new default.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user_id: UserId, address_id: AddressId) -> Result<Address> {
        let mut uow = self.store.begin().await?;
        let address = owned_address(&mut uow, user_id, address_id).await?;

        uow.delete_address(address_id).await?;
        uow.unlink_user_address(user_id, address_id).await?;

        if address.is_default {
            let remaining = uow.addresses_for_user(user_id).await?;
            if let Some(promoted) = remaining.last() {
                uow.set_default_address(user_id, promoted.id).await?;
                tracing::info!(promoted = %promoted.id, "default address promoted");
            }
        }

        uow.commit().await?;
        Ok(address)
    }
}

async fn owned_address<U: UnitOfWork>(
    uow: &mut U,
    user_id: UserId,
    address_id: AddressId,
) -> Result<Address> {
    let address = uow
        .find_address(address_id)
        .await?
        .ok_or(CheckoutError::AddressNotFound(address_id))?;
    if address.user_id != user_id {
        return Err(CheckoutError::PermissionDenied(address_id));
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::User;
    use store::InMemoryStore;

    fn fields(street: &str) -> NewAddress {
        NewAddress {
            first_name: "Asha".to_string(),
            last_name: "Verma".to_string(),
            street_address: street.to_string(),
            city: "Pune".to_string(),
            state: "MH".to_string(),
            zip_code: "411001".to_string(),
            mobile: None,
            is_default: false,
        }
    }

    async fn setup() -> (AddressService<InMemoryStore>, InMemoryStore, UserId) {
        let store = InMemoryStore::new();
        let user = User::new("Asha", "Verma", None, "9876543210");
        let mut uow = store.begin().await.unwrap();
        uow.insert_user(&user).await.unwrap();
        uow.commit().await.unwrap();
        (AddressService::new(store.clone()), store, user.id)
    }

    #[tokio::test]
    async fn resolve_without_payload_uses_default() {
        let (service, store, user_id) = setup().await;
        let first = service.create(user_id, fields("1 First St")).await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let resolved = resolve_shipping_address(&mut uow, user_id, None)
            .await
            .unwrap();
        assert_eq!(resolved.id, first.id);
    }

    #[tokio::test]
    async fn resolve_without_payload_or_default_fails() {
        let (_, store, user_id) = setup().await;

        let mut uow = store.begin().await.unwrap();
        let err = resolve_shipping_address(&mut uow, user_id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::NoDefaultAddress));
    }

    #[tokio::test]
    async fn resolve_unknown_id_fails() {
        let (_, store, user_id) = setup().await;
        let id = AddressId::new();

        let mut uow = store.begin().await.unwrap();
        let payload = Some(ShippingAddress::Existing { id });
        let err = resolve_shipping_address(&mut uow, user_id, payload)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::AddressNotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn create_requesting_default_clears_previous() {
        let (service, _, user_id) = setup().await;
        let first = service.create(user_id, fields("1 First St")).await.unwrap();
        let mut second_fields = fields("2 Second St");
        second_fields.is_default = true;
        let second = service.create(user_id, second_fields).await.unwrap();

        assert!(first.is_default);
        assert!(second.is_default);
        let all = service.list(user_id).await.unwrap();
        assert_eq!(all.iter().filter(|a| a.is_default).count(), 1);
        assert_eq!(service.default_address(user_id).await.unwrap().id, second.id);
    }

    #[tokio::test]
    async fn create_rejects_invalid_fields() {
        let (service, _, user_id) = setup().await;
        let mut bad = fields("1 First St");
        bad.zip_code = String::new();

        let err = service.create(user_id, bad).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[tokio::test]
    async fn create_for_unknown_user_fails() {
        let (service, _, _) = setup().await;
        let err = service
            .create(UserId::new(), fields("1 First St"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn other_users_cannot_modify_address() {
        let (service, _, user_id) = setup().await;
        let address = service.create(user_id, fields("1 First St")).await.unwrap();
        let stranger = UserId::new();

        assert!(matches!(
            service.set_default(stranger, address.id).await,
            Err(CheckoutError::PermissionDenied(_))
        ));
        assert!(matches!(
            service.delete(stranger, address.id).await,
            Err(CheckoutError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn delete_non_default_keeps_default() {
        let (service, store, user_id) = setup().await;
        let first = service.create(user_id, fields("1 First St")).await.unwrap();
        let second = service.create(user_id, fields("2 Second St")).await.unwrap();

        service.delete(user_id, second.id).await.unwrap();

        assert_eq!(service.default_address(user_id).await.unwrap().id, first.id);
        let mut uow = store.begin().await.unwrap();
        let user = uow.find_user(user_id).await.unwrap().unwrap();
        assert_eq!(user.address_ids, vec![first.id]);
    }
}
