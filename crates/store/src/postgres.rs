use std::collections::HashMap;

use async_trait::async_trait;
use common::{AddressId, CartId, CartItemId, OrderId, OrderItemId, ProductId, UserId};
use domain::{
    Address, Cart, CartItem, Money, Order, OrderItem, OrderNumber, OrderStatus, PaymentDetails,
    PaymentStatus, Product, Totals, User,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgPoolOptions, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    unit_of_work::{Store, UnitOfWork},
};

const ORDER_COLUMNS: &str = r#"
    id, order_number, user_id, item_ids, shipping_address_id, order_date, delivery_date,
    payment_method, transaction_id, payment_id, payment_status,
    total_price, total_discounted_price, discount, total_item, status, created_at
"#;

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool and wraps it in a store.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Uow = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork> {
        Ok(PgUnitOfWork {
            tx: self.pool.begin().await?,
        })
    }
}

/// Unit of work backed by a PostgreSQL transaction.
///
/// Dropping it without committing rolls the transaction back.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

fn corrupt(table: &'static str, reason: impl ToString) -> StoreError {
    StoreError::Corrupt {
        table,
        reason: reason.to_string(),
    }
}

fn count(table: &'static str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|e| corrupt(table, e))
}

fn uuids<T: Into<Uuid> + Copy>(ids: &[T]) -> Vec<Uuid> {
    ids.iter().map(|id| (*id).into()).collect()
}

fn totals_from_row(table: &'static str, row: &PgRow) -> Result<Totals> {
    Ok(Totals {
        total_price: Money::from_minor(row.try_get("total_price")?),
        total_discounted_price: Money::from_minor(row.try_get("total_discounted_price")?),
        discount: Money::from_minor(row.try_get("discount")?),
        total_item: count(table, row.try_get("total_item")?)?,
    })
}

fn row_to_user(row: PgRow) -> Result<User> {
    let address_ids: Vec<Uuid> = row.try_get("address_ids")?;
    Ok(User {
        id: UserId::from_uuid(row.try_get("id")?),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        mobile: row.try_get("mobile")?,
        address_ids: address_ids.into_iter().map(AddressId::from_uuid).collect(),
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_address(row: PgRow) -> Result<Address> {
    Ok(Address {
        id: AddressId::from_uuid(row.try_get("id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        street_address: row.try_get("street_address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        zip_code: row.try_get("zip_code")?,
        mobile: row.try_get("mobile")?,
        is_default: row.try_get("is_default")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_product(row: PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id")?),
        title: row.try_get("title")?,
        price: Money::from_minor(row.try_get("price")?),
        discounted_price: Money::from_minor(row.try_get("discounted_price")?),
    })
}

fn row_to_cart_item(row: PgRow) -> Result<CartItem> {
    Ok(CartItem {
        id: CartItemId::from_uuid(row.try_get("id")?),
        product_id: ProductId::from_uuid(row.try_get("product_id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        size: row.try_get("size")?,
        quantity: count("cart_items", row.try_get("quantity")?)?,
        price: Money::from_minor(row.try_get("price")?),
        discounted_price: Money::from_minor(row.try_get("discounted_price")?),
    })
}

fn row_to_order_item(row: PgRow) -> Result<OrderItem> {
    Ok(OrderItem {
        id: OrderItemId::from_uuid(row.try_get("id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        product_id: ProductId::from_uuid(row.try_get("product_id")?),
        size: row.try_get("size")?,
        quantity: count("order_items", row.try_get("quantity")?)?,
        price: Money::from_minor(row.try_get("price")?),
        discounted_price: Money::from_minor(row.try_get("discounted_price")?),
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_order(row: PgRow) -> Result<Order> {
    let number: String = row.try_get("order_number")?;
    let status: String = row.try_get("status")?;
    let payment_status: String = row.try_get("payment_status")?;
    let item_ids: Vec<Uuid> = row.try_get("item_ids")?;

    Ok(Order {
        id: OrderId::from_uuid(row.try_get("id")?),
        order_number: OrderNumber::parse(&number).map_err(|e| corrupt("orders", e))?,
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        item_ids: item_ids.into_iter().map(OrderItemId::from_uuid).collect(),
        shipping_address_id: AddressId::from_uuid(row.try_get("shipping_address_id")?),
        order_date: row.try_get("order_date")?,
        delivery_date: row.try_get("delivery_date")?,
        payment: PaymentDetails {
            payment_method: row.try_get("payment_method")?,
            transaction_id: row.try_get("transaction_id")?,
            payment_id: row.try_get("payment_id")?,
            status: payment_status
                .parse::<PaymentStatus>()
                .map_err(|e| corrupt("orders", e))?,
        },
        totals: totals_from_row("orders", &row)?,
        status: status
            .parse::<OrderStatus>()
            .map_err(|e| corrupt("orders", e))?,
        created_at: row.try_get("created_at")?,
    })
}

impl PgUnitOfWork {
    async fn cart_items(&mut self, cart_id: Uuid) -> Result<Vec<CartItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, user_id, size, quantity, price, discounted_price
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY line_no ASC
            "#,
        )
        .bind(cart_id)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_cart_item).collect()
    }

    async fn select_order(&mut self, id: OrderId, for_update: bool) -> Result<Option<Order>> {
        let lock = if for_update { "FOR UPDATE" } else { "" };
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 {lock}");

        sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(row_to_order)
            .transpose()
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>> {
        sqlx::query(
            r#"
            SELECT id, first_name, last_name, email, mobile, address_ids, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?
        .map(row_to_user)
        .transpose()
    }

    async fn insert_user(&mut self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, email, mobile, address_ids, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.mobile)
        .bind(uuids(&user.address_ids))
        .bind(user.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn link_user_address(&mut self, user_id: UserId, address_id: AddressId) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET address_ids = array_append(address_ids, $2)
            WHERE id = $1 AND NOT ($2 = ANY(address_ids))
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(address_id.as_uuid())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn unlink_user_address(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<()> {
        sqlx::query("UPDATE users SET address_ids = array_remove(address_ids, $2) WHERE id = $1")
            .bind(user_id.as_uuid())
            .bind(address_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn find_address(&mut self, id: AddressId) -> Result<Option<Address>> {
        sqlx::query("SELECT * FROM addresses WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(row_to_address)
            .transpose()
    }

    async fn addresses_for_user(&mut self, user_id: UserId) -> Result<Vec<Address>> {
        let rows =
            sqlx::query("SELECT * FROM addresses WHERE user_id = $1 ORDER BY created_at ASC, id ASC")
                .bind(user_id.as_uuid())
                .fetch_all(&mut *self.tx)
                .await?;

        rows.into_iter().map(row_to_address).collect()
    }

    async fn insert_address(&mut self, address: &Address) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO addresses (id, user_id, first_name, last_name, street_address, city, state,
                                   zip_code, mobile, is_default, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(address.id.as_uuid())
        .bind(address.user_id.as_uuid())
        .bind(&address.first_name)
        .bind(&address.last_name)
        .bind(&address.street_address)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(&address.mobile)
        .bind(address.is_default)
        .bind(address.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn set_default_address(&mut self, user_id: UserId, address_id: AddressId) -> Result<()> {
        sqlx::query("UPDATE addresses SET is_default = (id = $2) WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(address_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_address(&mut self, id: AddressId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_product(&mut self, product: &Product) -> Result<()> {
        sqlx::query(
            "INSERT INTO products (id, title, price, discounted_price) VALUES ($1, $2, $3, $4)",
        )
        .bind(product.id.as_uuid())
        .bind(&product.title)
        .bind(product.price.minor())
        .bind(product.discounted_price.minor())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn find_products(&mut self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let rows = sqlx::query("SELECT * FROM products WHERE id = ANY($1)")
            .bind(uuids(ids))
            .fetch_all(&mut *self.tx)
            .await?;

        rows.into_iter().map(row_to_product).collect()
    }

    async fn find_cart_for_update(&mut self, user_id: UserId) -> Result<Option<Cart>> {
        let Some(row) = sqlx::query(
            r#"
            SELECT id, user_id, total_price, total_discounted_price, discount, total_item
            FROM carts
            WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?
        else {
            return Ok(None);
        };

        let id: Uuid = row.try_get("id")?;
        let totals = totals_from_row("carts", &row)?;
        let items = self.cart_items(id).await?;

        Ok(Some(Cart {
            id: CartId::from_uuid(id),
            user_id: UserId::from_uuid(row.try_get("user_id")?),
            items,
            totals,
        }))
    }

    async fn save_cart(&mut self, cart: &Cart) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, total_price, total_discounted_price, discount, total_item)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                total_price = EXCLUDED.total_price,
                total_discounted_price = EXCLUDED.total_discounted_price,
                discount = EXCLUDED.discount,
                total_item = EXCLUDED.total_item
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.user_id.as_uuid())
        .bind(cart.totals.total_price.minor())
        .bind(cart.totals.total_discounted_price.minor())
        .bind(cart.totals.discount.minor())
        .bind(i64::from(cart.totals.total_item))
        .execute(&mut *self.tx)
        .await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        for (line_no, item) in (0_i64..).zip(&cart.items) {
            sqlx::query(
                r#"
                INSERT INTO cart_items (id, cart_id, line_no, product_id, user_id, size, quantity,
                                        price, discounted_price)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(cart.id.as_uuid())
            .bind(line_no)
            .bind(item.product_id.as_uuid())
            .bind(item.user_id.as_uuid())
            .bind(&item.size)
            .bind(i64::from(item.quantity))
            .bind(item.price.minor())
            .bind(item.discounted_price.minor())
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn delete_cart_items(&mut self, ids: &[CartItemId]) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE id = ANY($1)")
            .bind(uuids(ids))
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn reset_cart(&mut self, cart_id: CartId) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        sqlx::query(
            r#"
            UPDATE carts
            SET total_price = 0, total_discounted_price = 0, discount = 0, total_item = 0
            WHERE id = $1
            "#,
        )
        .bind(cart_id.as_uuid())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, user_id, product_id, size, quantity, price,
                                     discounted_price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.user_id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(&item.size)
        .bind(i64::from(item.quantity))
        .bind(item.price.minor())
        .bind(item.discounted_price.minor())
        .bind(item.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn find_order_items(&mut self, ids: &[OrderItemId]) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query("SELECT * FROM order_items WHERE id = ANY($1)")
            .bind(uuids(ids))
            .fetch_all(&mut *self.tx)
            .await?;

        let mut by_id = rows
            .into_iter()
            .map(|row| row_to_order_item(row).map(|item| (item.id, item)))
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn order_number_exists(&mut self, number: &OrderNumber) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE order_number = $1)")
                .bind(number.as_str())
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        let sql = format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)"
        );

        sqlx::query(&sql)
            .bind(order.id.as_uuid())
            .bind(order.order_number.as_str())
            .bind(order.user_id.as_uuid())
            .bind(uuids(&order.item_ids))
            .bind(order.shipping_address_id.as_uuid())
            .bind(order.order_date)
            .bind(order.delivery_date)
            .bind(&order.payment.payment_method)
            .bind(&order.payment.transaction_id)
            .bind(&order.payment.payment_id)
            .bind(order.payment.status.as_str())
            .bind(order.totals.total_price.minor())
            .bind(order.totals.total_discounted_price.minor())
            .bind(order.totals.discount.minor())
            .bind(i64::from(order.totals.total_item))
            .bind(order.status.as_str())
            .bind(order.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return StoreError::Conflict(format!(
                        "order number {} already exists",
                        order.order_number
                    ));
                }
                StoreError::Database(e)
            })?;
        Ok(())
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        self.select_order(id, false).await
    }

    async fn find_order_for_update(&mut self, id: OrderId) -> Result<Option<Order>> {
        self.select_order(id, true).await
    }

    async fn update_order_status(&mut self, order: &Order) -> Result<()> {
        sqlx::query("UPDATE orders SET status = $2, payment_status = $3 WHERE id = $1")
            .bind(order.id.as_uuid())
            .bind(order.status.as_str())
            .bind(order.payment.status.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn list_orders(&mut self, user_id: Option<UserId>) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE ($1::uuid IS NULL OR user_id = $1) \
             ORDER BY created_at DESC"
        );

        let rows = sqlx::query(&sql)
            .bind(user_id.map(Uuid::from))
            .fetch_all(&mut *self.tx)
            .await?;

        rows.into_iter().map(row_to_order).collect()
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<bool> {
        let item_ids: Option<Vec<Uuid>> =
            sqlx::query_scalar("DELETE FROM orders WHERE id = $1 RETURNING item_ids")
                .bind(id.as_uuid())
                .fetch_optional(&mut *self.tx)
                .await?;

        let Some(item_ids) = item_ids else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM order_items WHERE id = ANY($1)")
            .bind(item_ids)
            .execute(&mut *self.tx)
            .await?;
        Ok(true)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        metrics::counter!("store_commits_total").increment(1);
        Ok(())
    }
}
