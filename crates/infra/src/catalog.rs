//! Catalog adapters.

use std::collections::HashMap;
use std::sync::RwLock;

use cardboard_inventory::{CardId, Catalog};

/// In-memory card catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    cards: RwLock<HashMap<CardId, String>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, card: CardId, name: impl Into<String>) {
        if let Ok(mut cards) = self.cards.write() {
            cards.insert(card, name.into());
        }
    }

    /// Remove a card from the catalog. Items referencing it are not touched
    /// here; see `InventoryService::card_removed`.
    pub fn remove(&self, card: CardId) -> Option<String> {
        self.cards.write().ok()?.remove(&card)
    }
}

impl Catalog for InMemoryCatalog {
    fn card_name(&self, card: CardId) -> Option<String> {
        self.cards.read().ok()?.get(&card).cloned()
    }
}
