use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use common::{AddressId, CartId, CartItemId, OrderId, OrderItemId, ProductId, UserId};
use domain::{Address, Cart, Order, OrderItem, OrderNumber, Product, User};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Result, StoreError,
    unit_of_work::{Store, UnitOfWork},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    addresses: HashMap<AddressId, Address>,
    products: HashMap<ProductId, Product>,
    carts: HashMap<CartId, Cart>,
    orders: HashMap<OrderId, Order>,
    order_items: HashMap<OrderItemId, OrderItem>,
}

#[derive(Debug, Default)]
struct Faults {
    /// 1-based index of the order item insert that fails; 0 disables.
    order_item_insert_at: AtomicUsize,
    cart_reset: AtomicBool,
}

/// In-memory store implementation for testing and local runs.
///
/// Units of work are serialized: `begin` holds the table lock until the
/// unit of work is committed or dropped. Writes go to a private copy of the
/// tables that replaces the shared state only on commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    faults: Arc<Faults>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `n`th order item insert of every unit of work fail.
    /// Passing 0 turns the fault off.
    pub fn fail_order_item_insert_at(&self, n: usize) {
        self.faults.order_item_insert_at.store(n, Ordering::SeqCst);
    }

    /// Configures every cart reset to fail.
    pub fn set_fail_on_cart_reset(&self, fail: bool) {
        self.faults.cart_reset.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.tables.lock().await.orders.len()
    }

    /// Returns the number of committed order items.
    pub async fn order_item_count(&self) -> usize {
        self.tables.lock().await.order_items.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Uow = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<InMemoryUnitOfWork> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryUnitOfWork {
            guard,
            working,
            faults: Arc::clone(&self.faults),
            order_item_inserts: 0,
        })
    }
}

/// Unit of work over an [`InMemoryStore`].
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    faults: Arc<Faults>,
    order_item_inserts: usize,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn insert_user(&mut self, user: &User) -> Result<()> {
        self.working.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn link_user_address(&mut self, user_id: UserId, address_id: AddressId) -> Result<()> {
        if let Some(user) = self.working.users.get_mut(&user_id)
            && !user.address_ids.contains(&address_id)
        {
            user.address_ids.push(address_id);
        }
        Ok(())
    }

    async fn unlink_user_address(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<()> {
        if let Some(user) = self.working.users.get_mut(&user_id) {
            user.address_ids.retain(|id| *id != address_id);
        }
        Ok(())
    }

    async fn find_address(&mut self, id: AddressId) -> Result<Option<Address>> {
        Ok(self.working.addresses.get(&id).cloned())
    }

    async fn addresses_for_user(&mut self, user_id: UserId) -> Result<Vec<Address>> {
        let mut addresses: Vec<_> = self
            .working
            .addresses
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        addresses.sort_by_key(|a| (a.created_at, a.id));
        Ok(addresses)
    }

    async fn insert_address(&mut self, address: &Address) -> Result<()> {
        self.working.addresses.insert(address.id, address.clone());
        Ok(())
    }

    async fn set_default_address(&mut self, user_id: UserId, address_id: AddressId) -> Result<()> {
        for address in self
            .working
            .addresses
            .values_mut()
            .filter(|a| a.user_id == user_id)
        {
            address.is_default = address.id == address_id;
        }
        Ok(())
    }

    async fn delete_address(&mut self, id: AddressId) -> Result<bool> {
        Ok(self.working.addresses.remove(&id).is_some())
    }

    async fn insert_product(&mut self, product: &Product) -> Result<()> {
        self.working.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn find_products(&mut self, ids: &[ProductId]) -> Result<Vec<Product>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.working.products.get(id).cloned())
            .collect())
    }

    async fn find_cart_for_update(&mut self, user_id: UserId) -> Result<Option<Cart>> {
        Ok(self
            .working
            .carts
            .values()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn save_cart(&mut self, cart: &Cart) -> Result<()> {
        self.working.carts.insert(cart.id, cart.clone());
        Ok(())
    }

    async fn delete_cart_items(&mut self, ids: &[CartItemId]) -> Result<()> {
        for cart in self.working.carts.values_mut() {
            cart.items.retain(|item| !ids.contains(&item.id));
        }
        Ok(())
    }

    async fn reset_cart(&mut self, cart_id: CartId) -> Result<()> {
        if self.faults.cart_reset.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected(format!("cart reset for {cart_id}")));
        }
        if let Some(cart) = self.working.carts.get_mut(&cart_id) {
            cart.reset();
        }
        Ok(())
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<()> {
        self.order_item_inserts += 1;
        let fail_at = self.faults.order_item_insert_at.load(Ordering::SeqCst);
        if fail_at != 0 && self.order_item_inserts == fail_at {
            return Err(StoreError::Rejected(format!(
                "order item insert #{}",
                self.order_item_inserts
            )));
        }

        self.working.order_items.insert(item.id, item.clone());
        Ok(())
    }

    async fn find_order_items(&mut self, ids: &[OrderItemId]) -> Result<Vec<OrderItem>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.working.order_items.get(id).cloned())
            .collect())
    }

    async fn order_number_exists(&mut self, number: &OrderNumber) -> Result<bool> {
        Ok(self
            .working
            .orders
            .values()
            .any(|o| &o.order_number == number))
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        if self
            .working
            .orders
            .values()
            .any(|o| o.order_number == order.order_number && o.id != order.id)
        {
            return Err(StoreError::Conflict(format!(
                "order number {} already exists",
                order.order_number
            )));
        }

        self.working.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn find_order_for_update(&mut self, id: OrderId) -> Result<Option<Order>> {
        // The table lock is already held for the whole unit of work.
        self.find_order(id).await
    }

    async fn update_order_status(&mut self, order: &Order) -> Result<()> {
        if let Some(stored) = self.working.orders.get_mut(&order.id) {
            stored.status = order.status;
            stored.payment.status = order.payment.status;
        }
        Ok(())
    }

    async fn list_orders(&mut self, user_id: Option<UserId>) -> Result<Vec<Order>> {
        let mut orders: Vec<_> = self
            .working
            .orders
            .values()
            .filter(|o| user_id.is_none_or(|id| o.user_id == id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<bool> {
        let Some(order) = self.working.orders.remove(&id) else {
            return Ok(false);
        };
        for item_id in &order.item_ids {
            self.working.order_items.remove(item_id);
        }
        Ok(true)
    }

    async fn commit(self) -> Result<()> {
        let Self {
            mut guard, working, ..
        } = self;
        *guard = working;
        metrics::counter!("store_commits_total").increment(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnitOfWorkExt;
    use chrono::{Duration, Utc};
    use domain::{CartItem, Money, NewAddress, NewOrder, OrderStatus, Totals};

    fn address_fields() -> NewAddress {
        NewAddress {
            first_name: "Asha".to_string(),
            last_name: "Verma".to_string(),
            street_address: "12 MG Road".to_string(),
            city: "Pune".to_string(),
            state: "MH".to_string(),
            zip_code: "411001".to_string(),
            mobile: None,
            is_default: false,
        }
    }

    fn order_for(user_id: UserId, address_id: AddressId, items: &[OrderItem]) -> Order {
        NewOrder::new(
            user_id,
            address_id,
            items.iter().map(|i| i.id).collect(),
            Totals::zero(),
        )
        .build(Utc::now())
    }

    fn item_for(user_id: UserId) -> OrderItem {
        let product = Product::new("Shirt", Money::from_rupees(10), Money::from_rupees(8));
        OrderItem::from_cart_item(&CartItem::for_product(user_id, &product, 1, None))
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let store = InMemoryStore::new();
        let user = User::new("Asha", "Verma", None, "9876543210");

        let mut uow = store.begin().await.unwrap();
        uow.insert_user(&user).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.find_user(user.id).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn dropped_unit_of_work_rolls_back() {
        let store = InMemoryStore::new();
        let user = User::new("Asha", "Verma", None, "9876543210");

        {
            let mut uow = store.begin().await.unwrap();
            uow.insert_user(&user).await.unwrap();
        }

        let mut uow = store.begin().await.unwrap();
        assert!(uow.find_user(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_default_clears_other_addresses() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let first = Address::create(user_id, address_fields(), true);
        let second = Address::create(user_id, address_fields(), false);

        let mut uow = store.begin().await.unwrap();
        uow.insert_address(&first).await.unwrap();
        uow.insert_address(&second).await.unwrap();
        uow.set_default_address(user_id, second.id).await.unwrap();

        let default = uow.default_address(user_id).await.unwrap().unwrap();
        assert_eq!(default.id, second.id);
        let flags: Vec<bool> = uow
            .addresses_for_user(user_id)
            .await
            .unwrap()
            .iter()
            .map(|a| a.is_default)
            .collect();
        assert_eq!(flags.iter().filter(|d| **d).count(), 1);
    }

    #[tokio::test]
    async fn addresses_with_equal_timestamps_are_ordered_by_id() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let created_at = Utc::now();
        let mut addresses: Vec<Address> = (0..6)
            .map(|_| Address {
                created_at,
                ..Address::create(user_id, address_fields(), false)
            })
            .collect();
        let mut older = Address::create(user_id, address_fields(), false);
        older.created_at = created_at - Duration::minutes(5);

        let mut uow = store.begin().await.unwrap();
        for address in addresses.iter().chain([&older]) {
            uow.insert_address(address).await.unwrap();
        }

        addresses.sort_by_key(|a| a.id);
        let mut expected = vec![older.id];
        expected.extend(addresses.iter().map(|a| a.id));
        for _ in 0..3 {
            let listed: Vec<AddressId> = uow
                .addresses_for_user(user_id)
                .await
                .unwrap()
                .iter()
                .map(|a| a.id)
                .collect();
            assert_eq!(listed, expected);
        }
    }

    #[tokio::test]
    async fn order_item_fault_fails_only_the_configured_insert() {
        let store = InMemoryStore::new();
        store.fail_order_item_insert_at(2);
        let user_id = UserId::new();

        let mut uow = store.begin().await.unwrap();
        assert!(uow.insert_order_item(&item_for(user_id)).await.is_ok());
        let err = uow.insert_order_item(&item_for(user_id)).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        drop(uow);

        assert_eq!(store.order_item_count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_order_number_conflicts() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let first = order_for(user_id, AddressId::new(), &[]);
        let mut second = order_for(user_id, AddressId::new(), &[]);
        second.order_number = first.order_number.clone();

        let mut uow = store.begin().await.unwrap();
        uow.insert_order(&first).await.unwrap();
        assert!(uow.order_number_exists(&first.order_number).await.unwrap());
        let err = uow.insert_order(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_orders_is_newest_first_and_filters_by_user() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let mut older = order_for(user_id, AddressId::new(), &[]);
        older.created_at -= Duration::hours(1);
        let newer = order_for(user_id, AddressId::new(), &[]);
        let other = order_for(UserId::new(), AddressId::new(), &[]);

        let mut uow = store.begin().await.unwrap();
        for order in [&older, &newer, &other] {
            uow.insert_order(order).await.unwrap();
        }

        let mine = uow.list_orders(Some(user_id)).await.unwrap();
        assert_eq!(
            mine.iter().map(|o| o.id).collect::<Vec<_>>(),
            vec![newer.id, older.id]
        );
        assert_eq!(uow.list_orders(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn delete_order_removes_its_items() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let items = vec![item_for(user_id), item_for(user_id)];
        let order = order_for(user_id, AddressId::new(), &items);

        let mut uow = store.begin().await.unwrap();
        for item in &items {
            uow.insert_order_item(item).await.unwrap();
        }
        uow.insert_order(&order).await.unwrap();
        uow.commit().await.unwrap();
        assert_eq!(store.order_item_count().await, 2);

        let mut uow = store.begin().await.unwrap();
        assert!(uow.delete_order(order.id).await.unwrap());
        assert!(!uow.delete_order(order.id).await.unwrap());
        uow.commit().await.unwrap();

        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.order_item_count().await, 0);
    }

    #[tokio::test]
    async fn update_order_status_persists_status_and_payment() {
        let store = InMemoryStore::new();
        let mut order = order_for(UserId::new(), AddressId::new(), &[]);

        let mut uow = store.begin().await.unwrap();
        uow.insert_order(&order).await.unwrap();
        order.transition(OrderStatus::Placed).unwrap();
        uow.update_order_status(&order).await.unwrap();

        let stored = uow.find_order_for_update(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Placed);
        assert_eq!(stored.payment.status, order.payment.status);
    }

    #[tokio::test]
    async fn reset_cart_empties_lines_and_totals() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let product = Product::new("Shirt", Money::from_rupees(10), Money::from_rupees(8));
        let mut cart = Cart::new(user_id);
        cart.add_item(CartItem::for_product(user_id, &product, 3, None));

        let mut uow = store.begin().await.unwrap();
        uow.save_cart(&cart).await.unwrap();
        uow.delete_cart_items(&cart.item_ids()).await.unwrap();
        uow.reset_cart(cart.id).await.unwrap();

        let stored = uow.find_cart_for_update(user_id).await.unwrap().unwrap();
        assert_eq!(stored.id, cart.id);
        assert!(stored.is_empty());
        assert!(stored.totals.is_zero());
    }
}
