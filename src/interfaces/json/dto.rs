//! Wire shapes for order payloads.
//!
//! Foreign entities are nested as `{"id": ...}` objects (`"customer"`,
//! `"product"`, `"order"`). Monetary values are decimal strings.

use crate::domain::money::Price;
use crate::domain::order::{
    CustomerId, Item, ItemId, NewItem, NewOrder, Order, OrderId, OrderStatus, OrderSummary,
    OrderUpdate, ProductId, Quantity, UpdateStatus,
};
use crate::domain::transaction::{Transaction, TransactionId};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference<T> {
    pub id: T,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer: Reference<CustomerId>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<CreateItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub product: Reference<ProductId>,
    pub quantity: Quantity,
    #[serde(default)]
    pub price: Option<Price>,
}

impl From<CreateOrderRequest> for NewOrder {
    fn from(request: CreateOrderRequest) -> Self {
        NewOrder {
            customer_id: request.customer.id,
            status: request.status,
            items: request
                .items
                .into_iter()
                .map(|item| NewItem {
                    product_id: item.product.id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub customer: Reference<CustomerId>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<UpdateItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub id: ItemId,
    pub product: Reference<ProductId>,
    pub quantity: Quantity,
    pub price: Price,
}

impl UpdateOrderRequest {
    /// Fails with a validation error when the payload asks for `PAID`.
    pub fn into_update(self) -> Result<OrderUpdate> {
        Ok(OrderUpdate {
            status: UpdateStatus::try_from(self.status)?,
            customer_id: self.customer.id,
            date: self.date,
            items: self
                .items
                .into_iter()
                .map(|item| Item {
                    id: item.id,
                    product_id: item.product.id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: ItemId,
    pub product: Reference<ProductId>,
    pub quantity: Quantity,
    pub price: Price,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        ItemResponse {
            id: item.id,
            product: Reference { id: item.product_id },
            quantity: item.quantity,
            price: item.price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub customer: Reference<CustomerId>,
    pub date: DateTime<Utc>,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemResponse>>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            id: order.id,
            customer: Reference {
                id: order.customer_id,
            },
            date: order.date,
            status: order.status,
            items: Some(order.items.into_iter().map(ItemResponse::from).collect()),
        }
    }
}

impl From<OrderSummary> for OrderResponse {
    fn from(summary: OrderSummary) -> Self {
        OrderResponse {
            id: summary.id,
            customer: Reference {
                id: summary.customer_id,
            },
            date: summary.date,
            status: summary.status,
            items: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: TransactionId,
    pub order: Reference<OrderId>,
    pub date: DateTime<Utc>,
    pub amount: Price,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        TransactionResponse {
            id: tx.id,
            order: Reference { id: tx.order_id },
            date: tx.date,
            amount: tx.amount,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}
