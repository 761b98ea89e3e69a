//! Domain types for orders, their items and settlement transactions, plus the
//! ports the application layer drives.

pub mod money;
pub mod order;
pub mod ports;
pub mod transaction;
