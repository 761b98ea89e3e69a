//! Postgres adapter scenarios.
//!
//! Ignored by default because they need a Postgres instance reachable via
//! ORDERS_DATABASE_URL.
//!
//! Run:
//!   ORDERS_DATABASE_URL=... cargo test --features storage-postgres --test postgres_tests -- --ignored
#![cfg(feature = "storage-postgres")]

use ordersvc::application::engine::OrderEngine;
use ordersvc::domain::order::{
    CustomerId, NewItem, NewOrder, OrderId, OrderStatus, OrderUpdate, ProductId, Quantity,
    UpdateStatus,
};
use ordersvc::domain::ports::{Database, OrderStore, TransactionLedger, UnitOfWork};
use ordersvc::error::OrderError;
use ordersvc::infrastructure::postgres::{PgCatalog, PgDatabase};
use rust_decimal_macros::dec;
use std::time::Duration;

struct Seeded {
    engine: OrderEngine,
    database: PgDatabase,
    customer: CustomerId,
    products: [ProductId; 2],
}

async fn seeded() -> Seeded {
    let url = std::env::var("ORDERS_DATABASE_URL").expect("ORDERS_DATABASE_URL");
    let database = PgDatabase::connect(&url, 4, Duration::from_secs(5))
        .await
        .expect("db pool");
    database.ensure_schema().await.expect("schema");

    // Fresh ids per test so runs do not collide.
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let customer = format!("C-{suffix}");
    let products = [format!("P1-{suffix}"), format!("P2-{suffix}")];

    sqlx::query("insert into customers (id) values ($1)")
        .bind(&customer)
        .execute(database.pool())
        .await
        .expect("insert customer");
    for (id, price) in products.iter().zip([dec!(10.00), dec!(5.00)]) {
        sqlx::query("insert into products (id, price) values ($1, $2)")
            .bind(id)
            .bind(price)
            .execute(database.pool())
            .await
            .expect("insert product");
    }

    let engine = OrderEngine::new(
        Box::new(database.clone()),
        Box::new(PgCatalog::new(database.pool().clone())),
    );
    Seeded {
        engine,
        database,
        customer: CustomerId::new(customer).unwrap(),
        products: products.map(|id| ProductId::new(id).unwrap()),
    }
}

fn line(product_id: &ProductId, quantity: u32, price: Option<&str>) -> NewItem {
    NewItem {
        product_id: product_id.clone(),
        quantity: Quantity::new(quantity).unwrap(),
        price: price.map(|p| p.parse().unwrap()),
    }
}

#[tokio::test]
#[ignore]
async fn paid_cancel_delete_lifecycle() {
    let s = seeded().await;

    let order = s
        .engine
        .create_order(NewOrder {
            customer_id: s.customer.clone(),
            status: OrderStatus::Paid,
            items: vec![
                line(&s.products[0], 2, Some("10.00")),
                line(&s.products[1], 1, None),
            ],
        })
        .await
        .expect("create");

    let tx = s.engine.find_transaction(order.id).await.unwrap().unwrap();
    assert_eq!(tx.amount.value(), dec!(25.00));

    let fetched = s.engine.get_order(order.id).await.unwrap();
    assert_eq!(fetched.items, order.items);

    s.engine
        .update_order(
            order.id,
            OrderUpdate {
                customer_id: s.customer.clone(),
                date: None,
                status: UpdateStatus::Cancelled,
                items: order.items.clone(),
            },
        )
        .await
        .expect("cancel");
    assert!(s.engine.find_transaction(order.id).await.unwrap().is_none());
    assert_eq!(s.engine.get_order(order.id).await.unwrap().items.len(), 2);

    s.engine.delete_order(order.id).await.expect("delete");
    assert!(matches!(
        s.engine.get_order(order.id).await,
        Err(OrderError::NotFound { .. })
    ));

    let (items,): (i64,) = sqlx::query_as("select count(*) from order_items where order_id = $1")
        .bind(order.id.as_uuid())
        .fetch_one(s.database.pool())
        .await
        .unwrap();
    assert_eq!(items, 0);
}

#[tokio::test]
#[ignore]
async fn unknown_product_rolls_back_create() {
    let s = seeded().await;

    let result = s
        .engine
        .create_order(NewOrder {
            customer_id: s.customer.clone(),
            status: OrderStatus::Paid,
            items: vec![
                line(&s.products[0], 1, Some("10.00")),
                line(&ProductId::new("missing-product").unwrap(), 1, Some("1.00")),
            ],
        })
        .await;
    assert!(matches!(result, Err(OrderError::ReferenceError { .. })));

    let (orders,): (i64,) = sqlx::query_as("select count(*) from orders where customer_id = $1")
        .bind(s.customer.as_str())
        .fetch_one(s.database.pool())
        .await
        .unwrap();
    assert_eq!(orders, 0);
}

#[tokio::test]
#[ignore]
async fn second_transaction_for_order_is_rejected() {
    let s = seeded().await;
    let order = s
        .engine
        .create_order(NewOrder {
            customer_id: s.customer.clone(),
            status: OrderStatus::Paid,
            items: vec![line(&s.products[0], 1, None)],
        })
        .await
        .unwrap();

    let mut uow = s.database.begin().await.unwrap();
    let result = uow.insert_transaction(order.id, "1.00".parse().unwrap()).await;
    assert!(result.is_err());
    uow.rollback().await.unwrap();

    s.engine.shutdown().await;
}

#[tokio::test]
#[ignore]
async fn orders_with_equal_dates_list_in_insertion_order() {
    let s = seeded().await;

    // now() is fixed per transaction, so every row shares one order_date.
    let ids: Vec<OrderId> = (0..5).map(|_| OrderId::generate()).collect();
    let mut uow = s.database.begin().await.unwrap();
    let mut dates = Vec::new();
    for id in &ids {
        dates.push(uow.insert_order(*id, &s.customer, OrderStatus::Created).await.unwrap());
    }
    uow.commit().await.unwrap();
    assert!(dates.windows(2).all(|pair| pair[0] == pair[1]));

    let listed: Vec<OrderId> = s
        .engine
        .list_orders()
        .await
        .unwrap()
        .into_iter()
        .map(|summary| summary.id)
        .filter(|id| ids.contains(id))
        .collect();
    assert_eq!(listed, ids);

    s.engine.shutdown().await;
}
