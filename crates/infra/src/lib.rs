//! Infrastructure layer: storage, catalog adapter, configuration and the
//! inventory service that composes them.

pub mod catalog;
pub mod config;
pub mod error;
pub mod service;
pub mod store;

pub use catalog::InMemoryCatalog;
pub use config::Settings;
pub use error::{ServiceError, ServiceResult};
pub use service::InventoryService;
pub use store::{
    CascadeReport, InMemoryInventoryStore, InventoryStore, ItemFilter, StoreError, StoreResult,
};
