//! Inventory domain module.
//!
//! Business rules for a card collector's inventory: items, grading,
//! sub-collections (cubes, decks, trade lists, ...) and the per-user inventory.
//! Implemented as deterministic domain logic (no IO, no HTTP, no storage).

pub mod catalog;
pub mod choices;
pub mod grading;
pub mod ids;
pub mod item;
pub mod membership;
pub mod payload;
pub mod subcollection;
pub mod user_inventory;

pub use catalog::Catalog;
pub use choices::{Condition, Language};
pub use grading::{Grade, GradingDetails, GradingPayload, GradingService, compute_abbreviation};
pub use ids::{CardId, GradingDetailsId, InventoryItemId, SubCollectionId, UserInventoryId};
pub use item::{InventoryItem, ItemChanges, ItemFlags, NewInventoryItem};
pub use membership::{BatchMode, run_batch};
pub use subcollection::{NewSubCollection, SubCollection, SubCollectionChanges, SubCollectionKind};
pub use user_inventory::UserInventory;
