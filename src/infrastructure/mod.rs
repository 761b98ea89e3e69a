//! Storage and catalog adapters implementing the domain ports.

pub mod catalog;
pub mod in_memory;
#[cfg(feature = "storage-postgres")]
pub mod postgres;
