//! Persistence for the inventory aggregates.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryInventoryStore;
pub use r#trait::{CascadeReport, InventoryStore, ItemFilter, StoreError, StoreResult};
