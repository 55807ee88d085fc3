use std::sync::Arc;

use thiserror::Error;

use cardboard_auth::User;
use cardboard_core::{ExpectedVersion, UserId};
use cardboard_inventory::{
    CardId, GradingDetails, GradingDetailsId, InventoryItem, InventoryItemId, SubCollection,
    SubCollectionId, SubCollectionKind, UserInventory, UserInventoryId,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("record missing: {0}")]
    Missing(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Narrowing for item listings. Empty filter lists everything.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub owner: Option<UserId>,
    pub inventory: Option<UserInventoryId>,
}

impl ItemFilter {
    pub fn owned_by(owner: UserId) -> Self {
        Self {
            owner: Some(owner),
            inventory: None,
        }
    }

    pub fn in_inventory(inventory: UserInventoryId) -> Self {
        Self {
            owner: None,
            inventory: Some(inventory),
        }
    }

    pub fn matches(&self, item: &InventoryItem) -> bool {
        self.owner.is_none_or(|o| item.owner() == o)
            && self.inventory.is_none_or(|i| item.inventory() == Some(i))
    }
}

/// What an owner deletion removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub inventories: usize,
    pub subcollections: usize,
    pub items: usize,
    pub grading_details: usize,
}

/// Storage for users, inventories, sub-collections, items and grading details.
///
/// Writes are whole-record replacements guarded by [`ExpectedVersion`]; on
/// success the store assigns the next version to the passed record. Lists come
/// back in insertion order.
///
/// Implementations must make each method atomic on its own. Multi-record
/// methods (`attach_grading`, `delete_item`, `delete_user`,
/// `provision_inventory`) must be all-or-nothing.
pub trait InventoryStore: Send + Sync {
    fn insert_user(&self, user: User) -> StoreResult<()>;
    fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;
    /// Delete a user and everything they own.
    fn delete_user(&self, id: UserId) -> StoreResult<Option<CascadeReport>>;

    /// Insert `inventory` unless its owner already has one.
    fn provision_inventory(&self, inventory: &mut UserInventory) -> StoreResult<()>;
    fn get_inventory(&self, id: UserInventoryId) -> StoreResult<Option<UserInventory>>;
    fn inventory_for_owner(&self, owner: UserId) -> StoreResult<Option<UserInventory>>;
    /// Delete an inventory; its items stay but lose their membership.
    fn delete_inventory(&self, id: UserInventoryId) -> StoreResult<Option<UserInventory>>;

    fn insert_item(&self, item: &mut InventoryItem) -> StoreResult<()>;
    fn get_item(&self, id: InventoryItemId) -> StoreResult<Option<InventoryItem>>;
    fn update_item(&self, item: &mut InventoryItem, expected: ExpectedVersion) -> StoreResult<()>;
    /// Delete an item, its grading details and its sub-collection memberships.
    fn delete_item(&self, id: InventoryItemId) -> StoreResult<Option<InventoryItem>>;
    fn list_items(&self, filter: ItemFilter) -> StoreResult<Vec<InventoryItem>>;
    /// Clear the card link of every item referencing `card`. Returns how many changed.
    fn clear_card(&self, card: CardId) -> StoreResult<usize>;

    /// Insert `details`, drop `replaced` (if any) and save `item`, as one unit.
    fn attach_grading(
        &self,
        item: &mut InventoryItem,
        details: GradingDetails,
        replaced: Option<GradingDetailsId>,
        expected: ExpectedVersion,
    ) -> StoreResult<()>;
    fn get_grading_details(&self, id: GradingDetailsId) -> StoreResult<Option<GradingDetails>>;

    fn insert_subcollection(&self, subcollection: &mut SubCollection) -> StoreResult<()>;
    fn get_subcollection(&self, id: SubCollectionId) -> StoreResult<Option<SubCollection>>;
    fn update_subcollection(
        &self,
        subcollection: &mut SubCollection,
        expected: ExpectedVersion,
    ) -> StoreResult<()>;
    fn delete_subcollection(&self, id: SubCollectionId) -> StoreResult<Option<SubCollection>>;
    fn list_subcollections(
        &self,
        owner: UserId,
        kind: Option<SubCollectionKind>,
    ) -> StoreResult<Vec<SubCollection>>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn insert_user(&self, user: User) -> StoreResult<()> {
        (**self).insert_user(user)
    }

    fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        (**self).get_user(id)
    }

    fn delete_user(&self, id: UserId) -> StoreResult<Option<CascadeReport>> {
        (**self).delete_user(id)
    }

    fn provision_inventory(&self, inventory: &mut UserInventory) -> StoreResult<()> {
        (**self).provision_inventory(inventory)
    }

    fn get_inventory(&self, id: UserInventoryId) -> StoreResult<Option<UserInventory>> {
        (**self).get_inventory(id)
    }

    fn inventory_for_owner(&self, owner: UserId) -> StoreResult<Option<UserInventory>> {
        (**self).inventory_for_owner(owner)
    }

    fn delete_inventory(&self, id: UserInventoryId) -> StoreResult<Option<UserInventory>> {
        (**self).delete_inventory(id)
    }

    fn insert_item(&self, item: &mut InventoryItem) -> StoreResult<()> {
        (**self).insert_item(item)
    }

    fn get_item(&self, id: InventoryItemId) -> StoreResult<Option<InventoryItem>> {
        (**self).get_item(id)
    }

    fn update_item(&self, item: &mut InventoryItem, expected: ExpectedVersion) -> StoreResult<()> {
        (**self).update_item(item, expected)
    }

    fn delete_item(&self, id: InventoryItemId) -> StoreResult<Option<InventoryItem>> {
        (**self).delete_item(id)
    }

    fn list_items(&self, filter: ItemFilter) -> StoreResult<Vec<InventoryItem>> {
        (**self).list_items(filter)
    }

    fn clear_card(&self, card: CardId) -> StoreResult<usize> {
        (**self).clear_card(card)
    }

    fn attach_grading(
        &self,
        item: &mut InventoryItem,
        details: GradingDetails,
        replaced: Option<GradingDetailsId>,
        expected: ExpectedVersion,
    ) -> StoreResult<()> {
        (**self).attach_grading(item, details, replaced, expected)
    }

    fn get_grading_details(&self, id: GradingDetailsId) -> StoreResult<Option<GradingDetails>> {
        (**self).get_grading_details(id)
    }

    fn insert_subcollection(&self, subcollection: &mut SubCollection) -> StoreResult<()> {
        (**self).insert_subcollection(subcollection)
    }

    fn get_subcollection(&self, id: SubCollectionId) -> StoreResult<Option<SubCollection>> {
        (**self).get_subcollection(id)
    }

    fn update_subcollection(
        &self,
        subcollection: &mut SubCollection,
        expected: ExpectedVersion,
    ) -> StoreResult<()> {
        (**self).update_subcollection(subcollection, expected)
    }

    fn delete_subcollection(&self, id: SubCollectionId) -> StoreResult<Option<SubCollection>> {
        (**self).delete_subcollection(id)
    }

    fn list_subcollections(
        &self,
        owner: UserId,
        kind: Option<SubCollectionKind>,
    ) -> StoreResult<Vec<SubCollection>> {
        (**self).list_subcollections(owner, kind)
    }
}
