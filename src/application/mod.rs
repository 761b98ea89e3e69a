//! Application layer containing the order lifecycle orchestration.
//!
//! This module defines the `OrderEngine`, the single entry point for creating,
//! reading, updating and deleting orders. It drives the domain ports inside one
//! unit of work per request and enforces the status rules that decide whether
//! a settlement transaction exists.

pub mod engine;
