use crate::domain::money::Price;
use crate::domain::order::{
    CustomerId, Item, ItemId, LineItem, Order, OrderId, OrderStatus, OrderSummary, ProductId,
    Quantity,
};
use crate::domain::ports::{CatalogResolver, Database, OrderStore, TransactionLedger, UnitOfWork};
use crate::domain::transaction::Transaction;
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row};
use std::time::Duration;
use uuid::Uuid;

/// Bootstrap DDL for a fresh database. Every statement is idempotent.
///
/// `customers` and `products` belong to the directory/catalog services; they
/// are declared here so the foreign keys hold when everything shares one
/// database.
pub const SCHEMA: &str = r#"
create table if not exists customers (
    id text primary key,
    name text not null default ''
);

create table if not exists products (
    id text primary key,
    name text not null default '',
    price numeric not null check (price >= 0)
);

create table if not exists orders (
    id uuid primary key,
    customer_id text not null references customers (id),
    order_date timestamptz not null default now(),
    status text not null check (status in ('CREATED', 'PAID', 'CANCELLED')),
    seq bigserial not null
);

alter table orders add column if not exists seq bigserial not null;

drop index if exists orders_order_date_idx;
create index if not exists orders_order_date_seq_idx on orders (order_date, seq);

create table if not exists order_items (
    id uuid primary key default gen_random_uuid(),
    order_id uuid not null references orders (id) on delete cascade,
    line_no integer not null,
    product_id text not null references products (id),
    quantity integer not null check (quantity > 0),
    price numeric not null check (price >= 0)
);

create index if not exists order_items_order_id_idx on order_items (order_id);

create table if not exists transactions (
    id uuid primary key default gen_random_uuid(),
    order_id uuid not null unique references orders (id) on delete cascade,
    date timestamptz not null default now(),
    amount numeric not null
);
"#;

fn corrupt(column: &str, e: OrderError) -> OrderError {
    OrderError::PersistenceError(format!("unreadable {column} column: {e}"))
}

fn order_summary_from_row(row: &PgRow) -> Result<OrderSummary> {
    let id: Uuid = row.try_get("id")?;
    let customer_id: String = row.try_get("customer_id")?;
    let status: String = row.try_get("status")?;
    Ok(OrderSummary {
        id: id.into(),
        customer_id: CustomerId::new(customer_id).map_err(|e| corrupt("customer_id", e))?,
        date: row.try_get("order_date")?,
        status: status.parse().map_err(|e| corrupt("status", e))?,
    })
}

fn item_from_row(row: &PgRow) -> Result<Item> {
    let id: Uuid = row.try_get("id")?;
    let product_id: String = row.try_get("product_id")?;
    let quantity: i32 = row.try_get("quantity")?;
    let price: Decimal = row.try_get("price")?;
    Ok(Item {
        id: id.into(),
        product_id: ProductId::new(product_id).map_err(|e| corrupt("product_id", e))?,
        quantity: Quantity::try_from(i64::from(quantity)).map_err(|e| corrupt("quantity", e))?,
        price: Price::new(price).map_err(|e| corrupt("price", e))?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<Transaction> {
    let id: Uuid = row.try_get("id")?;
    let order_id: Uuid = row.try_get("order_id")?;
    let amount: Decimal = row.try_get("amount")?;
    Ok(Transaction {
        id: id.into(),
        order_id: order_id.into(),
        date: row.try_get("date")?,
        amount: Price::new(amount).map_err(|e| corrupt("amount", e))?,
    })
}

fn quantity_param(quantity: Quantity) -> Result<i32> {
    i32::try_from(quantity.get())
        .map_err(|_| OrderError::validation(format!("quantity {} out of range", quantity.get())))
}

/// PostgreSQL-backed database handle.
///
/// Clones share the underlying connection pool.
#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// Connects a pool to `url`.
    pub async fn connect(url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;
        tracing::info!(max_connections, "connected to Postgres");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies [`SCHEMA`].
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let mut tx = self.pool.begin().await?;
        // One snapshot per unit so an order and its items are read together.
        sqlx::query("set transaction isolation level repeatable read")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

pub struct PgUnitOfWork {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderStore for PgUnitOfWork {
    async fn insert_order(
        &mut self,
        id: OrderId,
        customer_id: &CustomerId,
        status: OrderStatus,
    ) -> Result<DateTime<Utc>> {
        let row = sqlx::query(
            r#"
            insert into orders (id, customer_id, order_date, status)
            values ($1, $2, now(), $3)
            returning order_date
            "#,
        )
        .bind(id.as_uuid())
        .bind(customer_id.as_str())
        .bind(status.as_str())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.try_get("order_date")?)
    }

    async fn insert_item(
        &mut self,
        order_id: OrderId,
        position: u32,
        line: &LineItem,
    ) -> Result<ItemId> {
        let line_no = i32::try_from(position)
            .map_err(|_| OrderError::validation(format!("too many items: {position}")))?;

        let row = sqlx::query(
            r#"
            insert into order_items (order_id, line_no, product_id, quantity, price)
            values ($1, $2, $3, $4, $5)
            returning id
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(line_no)
        .bind(line.product_id.as_str())
        .bind(quantity_param(line.quantity)?)
        .bind(line.price.value())
        .fetch_one(&mut *self.tx)
        .await?;

        let id: Uuid = row.try_get("id")?;
        Ok(id.into())
    }

    async fn update_order(
        &mut self,
        id: OrderId,
        customer_id: &CustomerId,
        date: Option<DateTime<Utc>>,
        status: OrderStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            update orders
               set customer_id = $1,
                   order_date = coalesce($2, order_date),
                   status = $3
             where id = $4
            "#,
        )
        .bind(customer_id.as_str())
        .bind(date)
        .bind(status.as_str())
        .bind(id.as_uuid())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_item(&mut self, order_id: OrderId, item: &Item) -> Result<bool> {
        let result = sqlx::query(
            r#"
            update order_items
               set product_id = $1, quantity = $2, price = $3
             where id = $4 and order_id = $5
            "#,
        )
        .bind(item.product_id.as_str())
        .bind(quantity_param(item.quantity)?)
        .bind(item.price.value())
        .bind(item.id.as_uuid())
        .bind(order_id.as_uuid())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<bool> {
        // order_items and transactions go with it through `on delete cascade`.
        let result = sqlx::query("delete from orders where id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let Some(row) = sqlx::query(
            "select id, customer_id, order_date, status from orders where id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?
        else {
            return Ok(None);
        };
        let summary = order_summary_from_row(&row)?;

        let rows = sqlx::query(
            r#"
            select id, product_id, quantity, price
              from order_items
             where order_id = $1
             order by line_no
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;
        let items = rows.iter().map(item_from_row).collect::<Result<Vec<_>>>()?;

        Ok(Some(Order {
            id: summary.id,
            customer_id: summary.customer_id,
            date: summary.date,
            status: summary.status,
            items,
        }))
    }

    async fn list_orders(&mut self) -> Result<Vec<OrderSummary>> {
        let rows = sqlx::query(
            "select id, customer_id, order_date, status from orders order by order_date, seq",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter().map(order_summary_from_row).collect()
    }

    async fn settlement_amount(&mut self, order_id: OrderId) -> Result<Price> {
        let row = sqlx::query(
            r#"
            select coalesce(sum(price * quantity), 0) as amount
              from order_items
             where order_id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await?;

        let amount: Decimal = row.try_get("amount")?;
        Price::new(amount).map_err(|e| corrupt("amount", e))
    }
}

#[async_trait]
impl TransactionLedger for PgUnitOfWork {
    async fn insert_transaction(&mut self, order_id: OrderId, amount: Price) -> Result<Transaction> {
        let row = sqlx::query(
            r#"
            insert into transactions (order_id, date, amount)
            values ($1, now(), $2)
            returning id, order_id, date, amount
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(amount.value())
        .fetch_one(&mut *self.tx)
        .await?;

        transaction_from_row(&row)
    }

    async fn delete_transactions(&mut self, order_id: OrderId) -> Result<u64> {
        let result = sqlx::query("delete from transactions where order_id = $1")
            .bind(order_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_transaction(&mut self, order_id: OrderId) -> Result<Option<Transaction>> {
        let row = sqlx::query(
            "select id, order_id, date, amount from transactions where order_id = $1",
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(transaction_from_row).transpose()
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        this.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let this = *self;
        this.tx.rollback().await?;
        Ok(())
    }
}

/// Resolver reading the `customers` and `products` tables.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogResolver for PgCatalog {
    async fn customer_exists(&self, id: &CustomerId) -> Result<bool> {
        let (exists,): (bool,) =
            sqlx::query_as("select exists (select 1 from customers where id = $1)")
                .bind(id.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn product_price(&self, id: &ProductId) -> Result<Option<Price>> {
        let row: Option<(Decimal,)> = sqlx::query_as("select price from products where id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(price,)| Price::new(price).map_err(|e| corrupt("price", e)))
            .transpose()
    }
}
