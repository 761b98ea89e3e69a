use crate::error::OrderError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::money::Price;

/// Engine-generated order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for OrderId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for OrderId {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(OrderError::validation("missing orderID"));
        }
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| OrderError::validation(format!("invalid orderID {s:?}: {e}")))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Store-assigned item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for ItemId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

macro_rules! reference_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Result<Self, OrderError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(OrderError::validation(concat!("missing ", $label, " id")));
                }
                Ok(Self(id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let id = String::deserialize(deserializer)?;
                Self::new(id).map_err(serde::de::Error::custom)
            }
        }
    };
}

reference_id!(
    /// Identifier of a customer owned by the customer directory.
    CustomerId,
    "customer"
);
reference_id!(
    /// Identifier of a product owned by the product catalog.
    ProductId,
    "product"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    #[default]
    Created,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Whether an order in this status must carry a settlement transaction.
    pub fn is_settled(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(OrderStatus::Created),
            "PAID" => Ok(OrderStatus::Paid),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(OrderError::validation(format!("invalid order status: {other}"))),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses an existing order may be moved to.
///
/// `PAID` is only reachable when the order is created, so it has no variant
/// here and the update path cannot express it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    Created,
    Cancelled,
}

impl TryFrom<OrderStatus> for UpdateStatus {
    type Error = OrderError;

    fn try_from(status: OrderStatus) -> Result<Self, Self::Error> {
        match status {
            OrderStatus::Created => Ok(UpdateStatus::Created),
            OrderStatus::Cancelled => Ok(UpdateStatus::Cancelled),
            OrderStatus::Paid => Err(OrderError::validation("cannot update order to PAID")),
        }
    }
}

impl From<UpdateStatus> for OrderStatus {
    fn from(status: UpdateStatus) -> Self {
        match status {
            UpdateStatus::Created => OrderStatus::Created,
            UpdateStatus::Cancelled => OrderStatus::Cancelled,
        }
    }
}

/// Positive item quantity, bounded by the 32-bit store column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub const MAX: u32 = i32::MAX as u32;

    pub fn new(value: u32) -> Result<Self, OrderError> {
        if value == 0 || value > Self::MAX {
            return Err(OrderError::validation(format!(
                "quantity must be between 1 and {}, got {value}",
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = OrderError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let value = u32::try_from(value)
            .map_err(|_| OrderError::validation(format!("quantity must be positive, got {value}")))?;
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// An item as submitted on order creation. A missing price is filled from the
/// catalog's canonical price.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub price: Option<Price>,
}

/// A priced line ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub price: Price,
}

/// A persisted order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub price: Price,
}

impl Item {
    pub fn from_line(id: ItemId, line: LineItem) -> Self {
        Self {
            id,
            product_id: line.product_id,
            quantity: line.quantity,
            price: line.price,
        }
    }

    pub fn line_total(&self) -> Result<Price, OrderError> {
        self.price.times(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub items: Vec<NewItem>,
}

/// Full replacement payload for an existing order. Items are matched by id
/// within the order; none are added or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdate {
    pub customer_id: CustomerId,
    pub date: Option<DateTime<Utc>>,
    pub status: UpdateStatus,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub date: DateTime<Utc>,
    pub status: OrderStatus,
    pub items: Vec<Item>,
}

impl Order {
    /// Σ price × quantity over the order's lines.
    pub fn settlement_amount(&self) -> Result<Price, OrderError> {
        Price::total(self.items.iter().map(Item::line_total))
    }

    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.id,
            customer_id: self.customer_id.clone(),
            date: self.date,
            status: self.status,
        }
    }
}

/// List view of an order; items are not loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub date: DateTime<Utc>,
    pub status: OrderStatus,
}
