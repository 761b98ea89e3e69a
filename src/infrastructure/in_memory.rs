use crate::domain::money::Price;
use crate::domain::order::{
    CustomerId, Item, ItemId, LineItem, Order, OrderId, OrderStatus, OrderSummary,
};
use crate::domain::ports::{Database, OrderStore, TransactionLedger, UnitOfWork};
use crate::domain::transaction::{Transaction, TransactionId};
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone)]
struct OrderRow {
    seq: u64,
    customer_id: CustomerId,
    date: DateTime<Utc>,
    status: OrderStatus,
}

#[derive(Debug, Clone)]
struct ItemRow {
    order_id: OrderId,
    position: u32,
    item: Item,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    next_seq: u64,
    orders: HashMap<OrderId, OrderRow>,
    items: Vec<ItemRow>,
    transactions: Vec<Transaction>,
}

/// A thread-safe in-memory database for orders, items and transactions.
///
/// Uses `Arc<Mutex<..>>` so clones share the same tables. A unit of work holds
/// the lock for its whole lifetime, which gives serializable isolation. Reads
/// go straight to the committed tables; the first write copies them into a
/// staged set that replaces the committed one on commit, so commits are
/// all-or-nothing. Ideal for testing or single-process use where persistence
/// is not required.
#[derive(Default, Clone)]
pub struct InMemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryDatabase {
    /// Creates a new, empty in-memory database.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        Ok(Box::new(InMemoryUnitOfWork {
            guard,
            staged: None,
        }))
    }
}

/// Unit of work over [`InMemoryDatabase`]; see the type docs for isolation.
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    staged: Option<Tables>,
}

impl InMemoryUnitOfWork {
    /// The unit's current view: staged writes if any, else the committed tables.
    fn tables(&self) -> &Tables {
        self.staged.as_ref().unwrap_or(&*self.guard)
    }

    /// Copies the committed tables on first use.
    fn tables_mut(&mut self) -> &mut Tables {
        let committed = &self.guard;
        self.staged.get_or_insert_with(|| (**committed).clone())
    }

    fn items_of(&self, order_id: OrderId) -> Vec<Item> {
        let mut rows: Vec<&ItemRow> = self
            .tables()
            .items
            .iter()
            .filter(|row| row.order_id == order_id)
            .collect();
        rows.sort_by_key(|row| row.position);
        rows.into_iter().map(|row| row.item.clone()).collect()
    }
}

#[async_trait]
impl OrderStore for InMemoryUnitOfWork {
    async fn insert_order(
        &mut self,
        id: OrderId,
        customer_id: &CustomerId,
        status: OrderStatus,
    ) -> Result<DateTime<Utc>> {
        if self.tables().orders.contains_key(&id) {
            return Err(OrderError::PersistenceError(format!(
                "duplicate order id {id}"
            )));
        }

        let date = Utc::now();
        let tables = self.tables_mut();
        let seq = tables.next_seq;
        tables.next_seq += 1;
        tables.orders.insert(
            id,
            OrderRow {
                seq,
                customer_id: customer_id.clone(),
                date,
                status,
            },
        );
        Ok(date)
    }

    async fn insert_item(
        &mut self,
        order_id: OrderId,
        position: u32,
        line: &LineItem,
    ) -> Result<ItemId> {
        if !self.tables().orders.contains_key(&order_id) {
            return Err(OrderError::PersistenceError(format!(
                "order_items references missing order {order_id}"
            )));
        }

        let id = ItemId::generate();
        self.tables_mut().items.push(ItemRow {
            order_id,
            position,
            item: Item::from_line(id, line.clone()),
        });
        Ok(id)
    }

    async fn update_order(
        &mut self,
        id: OrderId,
        customer_id: &CustomerId,
        date: Option<DateTime<Utc>>,
        status: OrderStatus,
    ) -> Result<bool> {
        if !self.tables().orders.contains_key(&id) {
            return Ok(false);
        }
        let Some(row) = self.tables_mut().orders.get_mut(&id) else {
            return Ok(false);
        };
        row.customer_id = customer_id.clone();
        if let Some(date) = date {
            row.date = date;
        }
        row.status = status;
        Ok(true)
    }

    async fn update_item(&mut self, order_id: OrderId, item: &Item) -> Result<bool> {
        let owned = |row: &ItemRow| row.order_id == order_id && row.item.id == item.id;
        if !self.tables().items.iter().any(owned) {
            return Ok(false);
        }
        let Some(row) = self.tables_mut().items.iter_mut().find(|row| owned(&**row)) else {
            return Ok(false);
        };
        row.item = item.clone();
        Ok(true)
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<bool> {
        if !self.tables().orders.contains_key(&id) {
            return Ok(false);
        }
        let tables = self.tables_mut();
        tables.orders.remove(&id);
        tables.items.retain(|row| row.order_id != id);
        tables.transactions.retain(|tx| tx.order_id != id);
        Ok(true)
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let Some(row) = self.tables().orders.get(&id) else {
            return Ok(None);
        };
        Ok(Some(Order {
            id,
            customer_id: row.customer_id.clone(),
            date: row.date,
            status: row.status,
            items: self.items_of(id),
        }))
    }

    async fn list_orders(&mut self) -> Result<Vec<OrderSummary>> {
        let mut rows: Vec<(&OrderId, &OrderRow)> = self.tables().orders.iter().collect();
        rows.sort_by_key(|(_, row)| (row.date, row.seq));
        Ok(rows
            .into_iter()
            .map(|(id, row)| OrderSummary {
                id: *id,
                customer_id: row.customer_id.clone(),
                date: row.date,
                status: row.status,
            })
            .collect())
    }

    async fn settlement_amount(&mut self, order_id: OrderId) -> Result<Price> {
        Price::total(
            self.tables()
                .items
                .iter()
                .filter(|row| row.order_id == order_id)
                .map(|row| row.item.line_total()),
        )
    }
}

#[async_trait]
impl TransactionLedger for InMemoryUnitOfWork {
    async fn insert_transaction(&mut self, order_id: OrderId, amount: Price) -> Result<Transaction> {
        if !self.tables().orders.contains_key(&order_id) {
            return Err(OrderError::PersistenceError(format!(
                "transactions references missing order {order_id}"
            )));
        }
        if self.tables().transactions.iter().any(|tx| tx.order_id == order_id) {
            return Err(OrderError::PersistenceError(format!(
                "order {order_id} already has a transaction"
            )));
        }

        let tx = Transaction {
            id: TransactionId::generate(),
            order_id,
            date: Utc::now(),
            amount,
        };
        self.tables_mut().transactions.push(tx.clone());
        Ok(tx)
    }

    async fn delete_transactions(&mut self, order_id: OrderId) -> Result<u64> {
        let removed = self
            .tables()
            .transactions
            .iter()
            .filter(|tx| tx.order_id == order_id)
            .count();
        if removed > 0 {
            self.tables_mut()
                .transactions
                .retain(|tx| tx.order_id != order_id);
        }
        Ok(removed as u64)
    }

    async fn find_transaction(&mut self, order_id: OrderId) -> Result<Option<Transaction>> {
        Ok(self
            .tables()
            .transactions
            .iter()
            .find(|tx| tx.order_id == order_id)
            .cloned())
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryUnitOfWork { mut guard, staged } = *self;
        if let Some(staged) = staged {
            *guard = staged;
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
