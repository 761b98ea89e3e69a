use crate::domain::order::{
    CustomerId, Item, LineItem, NewItem, NewOrder, Order, OrderId, OrderStatus, OrderSummary,
    OrderUpdate, ProductId,
};
use crate::domain::ports::{CatalogBox, DatabaseBox, OrderStore, TransactionLedger, UnitOfWork};
use crate::domain::transaction::Transaction;
use crate::error::{OrderError, Result};
use tracing::{debug, error, info, warn};

/// The order lifecycle engine.
///
/// `OrderEngine` owns the database handle and the catalog resolver. Every
/// operation runs inside exactly one unit of work: writes are committed as a
/// whole or rolled back before the error is returned, and reads see a single
/// consistent view. The engine keeps no state of its own between requests, so
/// it can be shared across tasks behind an `Arc`.
pub struct OrderEngine {
    database: DatabaseBox,
    catalog: CatalogBox,
}

impl OrderEngine {
    /// Creates a new `OrderEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `database` - The store for orders, items and transactions.
    /// * `catalog` - Resolver for customer and product references.
    pub fn new(database: DatabaseBox, catalog: CatalogBox) -> Self {
        Self { database, catalog }
    }

    /// Creates an order with its items, and its settlement transaction when
    /// the order starts out `PAID`.
    #[tracing::instrument(skip(self, order), fields(customer_id = %order.customer_id, status = %order.status))]
    pub async fn create_order(&self, order: NewOrder) -> Result<Order> {
        let mut uow = self.database.begin().await?;
        let outcome = self.create_in(uow.as_mut(), order).await;
        let created = commit_or_rollback(uow, outcome).await?;

        info!(order_id = %created.id, items = created.items.len(), "order created");
        Ok(created)
    }

    async fn create_in(&self, uow: &mut dyn UnitOfWork, order: NewOrder) -> Result<Order> {
        self.resolve_customer(&order.customer_id).await?;

        let id = OrderId::generate();
        let date = uow.insert_order(id, &order.customer_id, order.status).await?;

        let mut items = Vec::with_capacity(order.items.len());
        for (position, new_item) in order.items.into_iter().enumerate() {
            let line = self.price_line(new_item).await?;
            let position = u32::try_from(position)
                .map_err(|_| OrderError::validation("too many items in one order"))?;
            let item_id = uow.insert_item(id, position, &line).await?;
            items.push(Item::from_line(item_id, line));
        }

        if order.status.is_settled() {
            let amount = uow.settlement_amount(id).await?;
            let tx = uow.insert_transaction(id, amount).await?;
            debug!(order_id = %id, transaction_id = %tx.id, amount = %tx.amount, "settlement recorded");
        }

        Ok(Order {
            id,
            customer_id: order.customer_id,
            date,
            status: order.status,
            items,
        })
    }

    /// Rewrites an order and its listed items, then drops any settlement
    /// transaction, since an update can never leave the order `PAID`.
    #[tracing::instrument(skip(self, update), fields(order_id = %id))]
    pub async fn update_order(&self, id: OrderId, update: OrderUpdate) -> Result<Order> {
        let mut uow = self.database.begin().await?;
        let outcome = self.update_in(uow.as_mut(), id, update).await;
        let updated = commit_or_rollback(uow, outcome).await?;

        info!(status = %updated.status, items = updated.items.len(), "order updated");
        Ok(updated)
    }

    async fn update_in(
        &self,
        uow: &mut dyn UnitOfWork,
        id: OrderId,
        update: OrderUpdate,
    ) -> Result<Order> {
        self.resolve_customer(&update.customer_id).await?;
        for item in &update.items {
            self.resolve_product(&item.product_id).await?;
        }

        let status = OrderStatus::from(update.status);
        if !uow
            .update_order(id, &update.customer_id, update.date, status)
            .await?
        {
            return Err(OrderError::not_found("order", id));
        }

        for item in &update.items {
            if !uow.update_item(id, item).await? {
                return Err(OrderError::not_found("item", item.id));
            }
        }

        let removed = uow.delete_transactions(id).await?;
        if removed > 0 {
            debug!(order_id = %id, removed, "settlement removed");
        }

        uow.find_order(id)
            .await?
            .ok_or_else(|| OrderError::not_found("order", id))
    }

    /// Deletes an order; its items and transaction go with it. Deleting an
    /// unknown id succeeds.
    #[tracing::instrument(skip(self), fields(order_id = %id))]
    pub async fn delete_order(&self, id: OrderId) -> Result<()> {
        let mut uow = self.database.begin().await?;
        let outcome = uow.delete_order(id).await;
        let existed = commit_or_rollback(uow, outcome).await?;

        if existed {
            info!("order deleted");
        } else {
            debug!("delete requested for unknown order");
        }
        Ok(())
    }

    /// Returns the order with its items.
    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        let mut uow = self.database.begin().await?;
        let outcome = uow.find_order(id).await;
        release(uow, outcome)
            .await?
            .ok_or_else(|| OrderError::not_found("order", id))
    }

    /// Returns all orders, oldest first, without their items.
    pub async fn list_orders(&self) -> Result<Vec<OrderSummary>> {
        let mut uow = self.database.begin().await?;
        let outcome = uow.list_orders().await;
        release(uow, outcome).await
    }

    /// Returns the settlement transaction of an order, if it has one.
    pub async fn find_transaction(&self, order_id: OrderId) -> Result<Option<Transaction>> {
        let mut uow = self.database.begin().await?;
        let outcome = uow.find_transaction(order_id).await;
        release(uow, outcome).await
    }

    /// Consumes the engine and closes the database handle.
    pub async fn shutdown(self) {
        self.database.close().await;
        info!("order engine shut down");
    }

    async fn resolve_customer(&self, id: &CustomerId) -> Result<()> {
        if self.catalog.customer_exists(id).await? {
            Ok(())
        } else {
            Err(OrderError::unknown_reference("customer", id))
        }
    }

    async fn resolve_product(&self, id: &ProductId) -> Result<()> {
        match self.catalog.product_price(id).await? {
            Some(_) => Ok(()),
            None => Err(OrderError::unknown_reference("product", id)),
        }
    }

    /// Resolves the product and snapshots its catalog price when the item
    /// carries none.
    async fn price_line(&self, item: NewItem) -> Result<LineItem> {
        let canonical = self
            .catalog
            .product_price(&item.product_id)
            .await?
            .ok_or_else(|| OrderError::unknown_reference("product", &item.product_id))?;

        Ok(LineItem {
            price: item.price.unwrap_or(canonical),
            product_id: item.product_id,
            quantity: item.quantity,
        })
    }
}

/// Commits on success. On failure rolls back and returns the original error.
async fn commit_or_rollback<T>(uow: Box<dyn UnitOfWork>, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            warn!(error = %err, kind = err.kind().as_str(), "rolling back unit of work");
            if let Err(rollback_err) = uow.rollback().await {
                error!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

/// Ends a read-only unit of work.
async fn release<T>(uow: Box<dyn UnitOfWork>, outcome: Result<T>) -> Result<T> {
    if let Err(err) = uow.rollback().await {
        warn!(error = %err, "failed to release read-only unit of work");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Price;
    use crate::domain::order::{Quantity, UpdateStatus};
    use crate::infrastructure::catalog::InMemoryCatalog;
    use crate::infrastructure::in_memory::InMemoryDatabase;
    use rust_decimal_macros::dec;

    fn engine() -> OrderEngine {
        let catalog = InMemoryCatalog::new()
            .with_customer(CustomerId::new("C1").unwrap())
            .with_product(ProductId::new("P1").unwrap(), Price::new(dec!(10.00)).unwrap())
            .with_product(ProductId::new("P2").unwrap(), Price::new(dec!(5.00)).unwrap());
        OrderEngine::new(Box::new(InMemoryDatabase::new()), Box::new(catalog))
    }

    fn new_item(product: &str, quantity: u32, price: Option<&str>) -> NewItem {
        NewItem {
            product_id: ProductId::new(product).unwrap(),
            quantity: Quantity::new(quantity).unwrap(),
            price: price.map(|p| p.parse().unwrap()),
        }
    }

    #[tokio::test]
    async fn test_paid_order_gets_one_transaction() {
        let engine = engine();
        let order = engine
            .create_order(NewOrder {
                customer_id: CustomerId::new("C1").unwrap(),
                status: OrderStatus::Paid,
                items: vec![
                    new_item("P1", 2, Some("10.00")),
                    new_item("P2", 1, Some("5.00")),
                ],
            })
            .await
            .unwrap();

        let tx = engine.find_transaction(order.id).await.unwrap().unwrap();
        assert_eq!(tx.amount.to_string(), "25.00");
        assert_eq!(tx.order_id, order.id);
    }

    #[tokio::test]
    async fn test_missing_price_uses_catalog_price() {
        let engine = engine();
        let order = engine
            .create_order(NewOrder {
                customer_id: CustomerId::new("C1").unwrap(),
                status: OrderStatus::Created,
                items: vec![new_item("P2", 3, None)],
            })
            .await
            .unwrap();

        assert_eq!(order.items[0].price.value(), dec!(5.00));
        assert!(engine.find_transaction(order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_customer_is_reference_error() {
        let engine = engine();
        let result = engine
            .create_order(NewOrder {
                customer_id: CustomerId::new("nobody").unwrap(),
                status: OrderStatus::Created,
                items: vec![],
            })
            .await;

        assert!(matches!(result, Err(OrderError::ReferenceError { entity: "customer", .. })));
        assert!(engine.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_order_is_not_found() {
        let engine = engine();
        let result = engine
            .update_order(
                OrderId::generate(),
                OrderUpdate {
                    customer_id: CustomerId::new("C1").unwrap(),
                    date: None,
                    status: UpdateStatus::Cancelled,
                    items: vec![],
                },
            )
            .await;

        assert!(matches!(result, Err(OrderError::NotFound { entity: "order", .. })));
    }

    #[tokio::test]
    async fn test_get_unknown_order_is_not_found() {
        let engine = engine();
        assert!(matches!(
            engine.get_order(OrderId::generate()).await,
            Err(OrderError::NotFound { .. })
        ));
        engine.delete_order(OrderId::generate()).await.unwrap();
        engine.shutdown().await;
    }
}
