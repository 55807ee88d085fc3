//! Catalog collaborator: the card data this crate references but does not own.

use std::sync::Arc;

use crate::ids::CardId;

/// Read-only view of the card catalog.
pub trait Catalog: Send + Sync {
    /// Display name used in item labels, e.g. `Arid Mesa [EXP]`.
    fn card_name(&self, card: CardId) -> Option<String>;

    fn contains(&self, card: CardId) -> bool {
        self.card_name(card).is_some()
    }
}

impl<C> Catalog for Arc<C>
where
    C: Catalog + ?Sized,
{
    fn card_name(&self, card: CardId) -> Option<String> {
        (**self).card_name(card)
    }

    fn contains(&self, card: CardId) -> bool {
        (**self).contains(card)
    }
}
