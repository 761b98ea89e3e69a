#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ordersvc::application::engine::OrderEngine;
use ordersvc::domain::money::Price;
use ordersvc::domain::order::{
    CustomerId, Item, ItemId, LineItem, NewItem, NewOrder, Order, OrderId, OrderStatus,
    OrderSummary, ProductId, Quantity,
};
use ordersvc::domain::ports::{Database, OrderStore, TransactionLedger, UnitOfWork};
use ordersvc::domain::transaction::Transaction;
use ordersvc::error::{OrderError, Result};
use ordersvc::infrastructure::catalog::InMemoryCatalog;
use ordersvc::infrastructure::in_memory::InMemoryDatabase;
use rust_decimal::Decimal;

/// Customers `C1`, `C2` and products `P1` (10.00), `P2` (5.00), `P3` (0.99).
pub fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_customer(customer("C1"))
        .with_customer(customer("C2"))
        .with_product(product("P1"), price("10.00"))
        .with_product(product("P2"), price("5.00"))
        .with_product(product("P3"), price("0.99"))
}

pub fn engine_with(database: impl Database + 'static) -> OrderEngine {
    OrderEngine::new(Box::new(database), Box::new(catalog()))
}

pub fn in_memory_engine() -> (OrderEngine, InMemoryDatabase) {
    let database = InMemoryDatabase::new();
    (engine_with(database.clone()), database)
}

pub fn customer(id: &str) -> CustomerId {
    CustomerId::new(id).unwrap()
}

pub fn product(id: &str) -> ProductId {
    ProductId::new(id).unwrap()
}

pub fn price(value: &str) -> Price {
    value.parse().unwrap()
}

pub fn item(product_id: &str, quantity: u32, unit_price: &str) -> NewItem {
    NewItem {
        product_id: product(product_id),
        quantity: Quantity::new(quantity).unwrap(),
        price: Some(price(unit_price)),
    }
}

pub fn new_order(customer_id: &str, status: OrderStatus, items: Vec<NewItem>) -> NewOrder {
    NewOrder {
        customer_id: customer(customer_id),
        status,
        items,
    }
}

/// The create request from the reference lifecycle scenario.
pub fn paid_scenario_order() -> NewOrder {
    new_order(
        "C1",
        OrderStatus::Paid,
        vec![item("P1", 2, "10.00"), item("P2", 1, "5.00")],
    )
}

pub fn expected_amount(items: &[NewItem]) -> Decimal {
    items
        .iter()
        .map(|i| i.price.unwrap().value() * Decimal::from(i.quantity.get()))
        .sum()
}

/// Failure injected into every unit of work opened by a [`FaultyDatabase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fails the nth (0-based) item insert of the unit.
    InsertItem(usize),
    InsertTransaction,
    DeleteTransactions,
    Commit,
}

/// Wraps the in-memory database and fails one step of each unit of work.
#[derive(Clone)]
pub struct FaultyDatabase {
    inner: InMemoryDatabase,
    fault: Fault,
}

impl FaultyDatabase {
    pub fn new(inner: InMemoryDatabase, fault: Fault) -> Self {
        Self { inner, fault }
    }
}

#[async_trait]
impl Database for FaultyDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(FaultyUnitOfWork {
            inner,
            fault: self.fault,
            items_inserted: 0,
        }))
    }
}

pub struct FaultyUnitOfWork {
    inner: Box<dyn UnitOfWork>,
    fault: Fault,
    items_inserted: usize,
}

fn injected(step: &str) -> OrderError {
    OrderError::PersistenceError(format!("injected failure in {step}"))
}

#[async_trait]
impl OrderStore for FaultyUnitOfWork {
    async fn insert_order(
        &mut self,
        id: OrderId,
        customer_id: &CustomerId,
        status: OrderStatus,
    ) -> Result<DateTime<Utc>> {
        self.inner.insert_order(id, customer_id, status).await
    }

    async fn insert_item(
        &mut self,
        order_id: OrderId,
        position: u32,
        line: &LineItem,
    ) -> Result<ItemId> {
        if self.fault == Fault::InsertItem(self.items_inserted) {
            return Err(injected("insert_item"));
        }
        self.items_inserted += 1;
        self.inner.insert_item(order_id, position, line).await
    }

    async fn update_order(
        &mut self,
        id: OrderId,
        customer_id: &CustomerId,
        date: Option<DateTime<Utc>>,
        status: OrderStatus,
    ) -> Result<bool> {
        self.inner.update_order(id, customer_id, date, status).await
    }

    async fn update_item(&mut self, order_id: OrderId, item: &Item) -> Result<bool> {
        self.inner.update_item(order_id, item).await
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<bool> {
        self.inner.delete_order(id).await
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        self.inner.find_order(id).await
    }

    async fn list_orders(&mut self) -> Result<Vec<OrderSummary>> {
        self.inner.list_orders().await
    }

    async fn settlement_amount(&mut self, order_id: OrderId) -> Result<Price> {
        self.inner.settlement_amount(order_id).await
    }
}

#[async_trait]
impl TransactionLedger for FaultyUnitOfWork {
    async fn insert_transaction(&mut self, order_id: OrderId, amount: Price) -> Result<Transaction> {
        if self.fault == Fault::InsertTransaction {
            return Err(injected("insert_transaction"));
        }
        self.inner.insert_transaction(order_id, amount).await
    }

    async fn delete_transactions(&mut self, order_id: OrderId) -> Result<u64> {
        if self.fault == Fault::DeleteTransactions {
            return Err(injected("delete_transactions"));
        }
        self.inner.delete_transactions(order_id).await
    }

    async fn find_transaction(&mut self, order_id: OrderId) -> Result<Option<Transaction>> {
        self.inner.find_transaction(order_id).await
    }
}

#[async_trait]
impl UnitOfWork for FaultyUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        if this.fault == Fault::Commit {
            this.inner.rollback().await?;
            return Err(injected("commit"));
        }
        this.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let this = *self;
        this.inner.rollback().await
    }
}
