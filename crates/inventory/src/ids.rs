//! Identifiers for inventory entities.
//!
//! Each wraps an [`AggregateId`] so ids of different entities cannot be mixed up.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use cardboard_core::{AggregateId, DomainError};

macro_rules! entity_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(pub AggregateId);

        impl $t {
            pub fn new(id: AggregateId) -> Self {
                Self(id)
            }

            pub fn generate() -> Self {
                Self(AggregateId::new())
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                AggregateId::from_str(s)
                    .map(Self)
                    .map_err(|_| {
                        DomainError::invalid_id(format!("{}: '{}' is not a valid UUID", $name, s))
                    })
            }
        }
    };
}

entity_id!(
    /// Inventory item identifier.
    InventoryItemId,
    "InventoryItemId"
);
entity_id!(
    /// Sub-collection identifier.
    SubCollectionId,
    "SubCollectionId"
);
entity_id!(
    /// User inventory identifier (one per owner).
    UserInventoryId,
    "UserInventoryId"
);
entity_id!(
    /// Grading details identifier.
    GradingDetailsId,
    "GradingDetailsId"
);
entity_id!(
    /// Reference to a catalog entry (a card). Owned by the catalog, never mutated here.
    CardId,
    "CardId"
);
