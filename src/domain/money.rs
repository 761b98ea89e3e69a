use crate::error::OrderError;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::order::Quantity;

/// A non-negative monetary value.
///
/// Wraps `rust_decimal::Decimal` so prices and settlement amounts never pass
/// through binary floating point. On the wire it is always decimal text
/// (`"10.00"`); JSON numbers are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, OrderError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(OrderError::validation("price must not be negative"))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Total for a line of `quantity` units at this unit price.
    pub fn times(&self, quantity: Quantity) -> Result<Self, OrderError> {
        self.0
            .checked_mul(Decimal::from(quantity.get()))
            .map(Self)
            .ok_or_else(|| overflow(format!("{} x {}", self.0, quantity.get())))
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, OrderError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or_else(|| overflow(format!("{} + {}", self.0, rhs.0)))
    }

    /// Sums `prices`, failing instead of overflowing. An empty input is zero.
    pub fn total<I>(prices: I) -> Result<Self, OrderError>
    where
        I: IntoIterator<Item = Result<Self, OrderError>>,
    {
        prices
            .into_iter()
            .try_fold(Self::ZERO, |acc, price| acc.checked_add(price?))
    }
}

fn overflow(expr: String) -> OrderError {
    OrderError::validation(format!("amount out of range: {expr}"))
}

impl TryFrom<Decimal> for Price {
    type Error = OrderError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str_exact(s.trim())
            .map_err(|e| OrderError::validation(format!("invalid price {s:?}: {e}")))?;
        Self::new(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
