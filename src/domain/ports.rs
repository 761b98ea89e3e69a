use super::money::Price;
use super::order::{CustomerId, Item, ItemId, LineItem, Order, OrderId, OrderStatus, OrderSummary, ProductId};
use super::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Row-level access to orders and their items. No business rules live here.
#[async_trait]
pub trait OrderStore: Send {
    /// Inserts the order row and returns the date the store stamped on it.
    async fn insert_order(
        &mut self,
        id: OrderId,
        customer_id: &CustomerId,
        status: OrderStatus,
    ) -> Result<DateTime<Utc>>;

    /// Inserts one line at `position` within the order and returns its new id.
    async fn insert_item(&mut self, order_id: OrderId, position: u32, line: &LineItem)
    -> Result<ItemId>;

    /// Rewrites the order columns. A `None` date keeps the stored one.
    /// Returns `false` when no such order exists.
    async fn update_order(
        &mut self,
        id: OrderId,
        customer_id: &CustomerId,
        date: Option<DateTime<Utc>>,
        status: OrderStatus,
    ) -> Result<bool>;

    /// Rewrites an item's columns, matching on both item id and order id.
    /// Returns `false` when the item does not belong to the order.
    async fn update_item(&mut self, order_id: OrderId, item: &Item) -> Result<bool>;

    /// Deletes the order together with its items and transaction.
    /// Returns `false` when nothing was deleted.
    async fn delete_order(&mut self, id: OrderId) -> Result<bool>;

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>>;

    /// All orders by date ascending, without items.
    async fn list_orders(&mut self) -> Result<Vec<OrderSummary>>;

    /// Σ price × quantity over the order's current items.
    async fn settlement_amount(&mut self, order_id: OrderId) -> Result<Price>;
}

/// Settlement records keyed by order.
#[async_trait]
pub trait TransactionLedger: Send {
    async fn insert_transaction(&mut self, order_id: OrderId, amount: Price) -> Result<Transaction>;

    /// Returns how many rows were removed; zero is not an error.
    async fn delete_transactions(&mut self, order_id: OrderId) -> Result<u64>;

    async fn find_transaction(&mut self, order_id: OrderId) -> Result<Option<Transaction>>;
}

/// One atomic unit of work over the order store and the ledger.
///
/// Nothing written through it is visible to other units until `commit`.
/// Dropping it without committing has the same effect as `rollback`.
#[async_trait]
pub trait UnitOfWork: OrderStore + TransactionLedger {
    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Handle to the durable store. Opens units of work.
#[async_trait]
pub trait Database: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;

    /// Releases the underlying resources. Further calls to `begin` may fail.
    async fn close(&self) {}
}

/// Existence checks against the customer directory and product catalog.
#[async_trait]
pub trait CatalogResolver: Send + Sync {
    async fn customer_exists(&self, id: &CustomerId) -> Result<bool>;

    /// Canonical price of the product, or `None` when it does not exist.
    async fn product_price(&self, id: &ProductId) -> Result<Option<Price>>;
}

pub type DatabaseBox = Box<dyn Database>;
pub type CatalogBox = Box<dyn CatalogResolver>;
