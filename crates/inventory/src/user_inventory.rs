//! User inventory: the per-owner root of everything a user tracks.
//!
//! Membership is recorded on each item (`InventoryItem::inventory`), since an
//! item belongs to at most one inventory. Sub-collections are not stored here;
//! the kind views filter the owner's sub-collections on every call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cardboard_core::{AggregateRoot, DomainError, DomainResult, Entity, UserId};

use crate::ids::{InventoryItemId, UserInventoryId};
use crate::item::{InventoryItem, NewInventoryItem};
use crate::membership::{BatchMode, owned_by, run_batch};
use crate::subcollection::{SubCollection, SubCollectionKind};

/// Aggregate root: UserInventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInventory {
    id: UserInventoryId,
    owner: UserId,
    created_at: DateTime<Utc>,
    version: u64,
}

impl UserInventory {
    /// New inventory for `owner`. Uniqueness per owner is the store's job.
    pub fn provision(id: UserInventoryId, owner: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner,
            created_at: now,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> UserInventoryId {
        self.id
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// E.g. `alice's Inventory`.
    pub fn display_name(&self, owner_username: &str) -> String {
        format!("{owner_username}'s Inventory")
    }

    pub fn contains(&self, item: &InventoryItem) -> bool {
        item.inventory() == Some(self.id)
    }

    /// Sub-collections of this inventory's owner having `kind`, in input order.
    pub fn subcollections_of_kind<I>(
        &self,
        kind: SubCollectionKind,
        subcollections: I,
    ) -> Vec<SubCollection>
    where
        I: IntoIterator<Item = SubCollection>,
    {
        subcollections
            .into_iter()
            .filter(|s| s.owner() == self.owner && s.kind() == kind)
            .collect()
    }

    pub fn cubes<I>(&self, subcollections: I) -> Vec<SubCollection>
    where
        I: IntoIterator<Item = SubCollection>,
    {
        self.subcollections_of_kind(SubCollectionKind::Cube, subcollections)
    }

    pub fn decks<I>(&self, subcollections: I) -> Vec<SubCollection>
    where
        I: IntoIterator<Item = SubCollection>,
    {
        self.subcollections_of_kind(SubCollectionKind::Deck, subcollections)
    }

    pub fn collections<I>(&self, subcollections: I) -> Vec<SubCollection>
    where
        I: IntoIterator<Item = SubCollection>,
    {
        self.subcollections_of_kind(SubCollectionKind::Collection, subcollections)
    }

    pub fn tradelists<I>(&self, subcollections: I) -> Vec<SubCollection>
    where
        I: IntoIterator<Item = SubCollection>,
    {
        self.subcollections_of_kind(SubCollectionKind::Tradelist, subcollections)
    }

    pub fn other_subcollections<I>(&self, subcollections: I) -> Vec<SubCollection>
    where
        I: IntoIterator<Item = SubCollection>,
    {
        self.subcollections_of_kind(SubCollectionKind::Other, subcollections)
    }

    /// Create an item owned by this inventory's owner and already a member of it.
    pub fn add_card_to_inventory(
        &self,
        id: InventoryItemId,
        card_data: NewInventoryItem,
        now: DateTime<Utc>,
    ) -> InventoryItem {
        let mut item = InventoryItem::create(id, self.owner, card_data, now);
        item.join_inventory(self.id);
        item
    }

    /// Make the resolved items members of this inventory.
    ///
    /// `save` persists each changed item as soon as it is updated, so in
    /// [`BatchMode::FailFast`] items before an unresolved id stay members.
    /// Items owned by someone else are rejected.
    pub fn add_items_to_inventory<I, R, S, E>(
        &self,
        ids: I,
        mode: BatchMode,
        resolve: R,
        mut save: S,
    ) -> Result<usize, E>
    where
        I: IntoIterator<Item = InventoryItemId>,
        R: FnMut(InventoryItemId) -> DomainResult<InventoryItem>,
        S: FnMut(InventoryItem) -> Result<(), E>,
        E: From<DomainError>,
    {
        let resolve = owned_by(self.owner, resolve);
        run_batch(ids, mode, resolve, |mut item| {
            if item.join_inventory(self.id) {
                save(item)?;
                Ok(true)
            } else {
                Ok(false)
            }
        })
    }

    /// Remove the resolved items from this inventory; non-members are a no-op.
    ///
    /// Same failure semantics as [`UserInventory::add_items_to_inventory`].
    pub fn remove_items_from_inventory<I, R, S, E>(
        &self,
        ids: I,
        mode: BatchMode,
        resolve: R,
        mut save: S,
    ) -> Result<usize, E>
    where
        I: IntoIterator<Item = InventoryItemId>,
        R: FnMut(InventoryItemId) -> DomainResult<InventoryItem>,
        S: FnMut(InventoryItem) -> Result<(), E>,
        E: From<DomainError>,
    {
        let resolve = owned_by(self.owner, resolve);
        run_batch(ids, mode, resolve, |mut item| {
            if item.leave_inventory(self.id) {
                save(item)?;
                Ok(true)
            } else {
                Ok(false)
            }
        })
    }
}

impl Entity for UserInventory {
    type Id = UserInventoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for UserInventory {
    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::ids::SubCollectionId;
    use crate::subcollection::NewSubCollection;
    use cardboard_core::ErrorKind;

    struct Fixture {
        inventory: UserInventory,
        items: RefCell<HashMap<InventoryItemId, InventoryItem>>,
        order: Vec<InventoryItemId>,
    }

    impl Fixture {
        fn new(n: usize) -> Self {
            let owner = UserId::new();
            let inventory =
                UserInventory::provision(UserInventoryId::generate(), owner, Utc::now());
            let mut items = HashMap::new();
            let mut order = Vec::new();
            for _ in 0..n {
                let item = InventoryItem::create(
                    InventoryItemId::generate(),
                    owner,
                    NewInventoryItem::default(),
                    Utc::now(),
                );
                order.push(item.id_typed());
                items.insert(item.id_typed(), item);
            }
            Self {
                inventory,
                items: RefCell::new(items),
                order,
            }
        }

        fn resolve(&self) -> impl FnMut(InventoryItemId) -> DomainResult<InventoryItem> + '_ {
            move |id| {
                self.items
                    .borrow()
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| DomainError::not_found("inventory item", id))
            }
        }

        fn save(&self) -> impl FnMut(InventoryItem) -> DomainResult<()> + '_ {
            move |item| {
                self.items.borrow_mut().insert(item.id_typed(), item);
                Ok(())
            }
        }

        fn members(&self) -> usize {
            self.items
                .borrow()
                .values()
                .filter(|i| self.inventory.contains(i))
                .count()
        }

        fn add(&self, ids: Vec<InventoryItemId>, mode: BatchMode) -> DomainResult<usize> {
            self.inventory.add_items_to_inventory(ids, mode, self.resolve(), self.save())
        }

        fn remove(&self, ids: Vec<InventoryItemId>, mode: BatchMode) -> DomainResult<usize> {
            self.inventory.remove_items_from_inventory(ids, mode, self.resolve(), self.save())
        }
    }

    #[test]
    fn adding_items_sets_membership_once() {
        let fx = Fixture::new(2);
        assert_eq!(fx.add(fx.order.clone(), BatchMode::FailFast).unwrap(), 2);
        assert_eq!(fx.members(), 2);
        assert_eq!(fx.add(fx.order.clone(), BatchMode::FailFast).unwrap(), 0);
        assert_eq!(fx.members(), 2);
    }

    #[test]
    fn fail_fast_persists_items_before_the_invalid_id() {
        let fx = Fixture::new(2);
        let missing = InventoryItemId::generate();
        let ids = vec![fx.order[0], missing, fx.order[1]];

        let err = fx.add(ids, BatchMode::FailFast).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.offending_item(), Some(missing.to_string().as_str()));
        assert_eq!(fx.members(), 1);
    }

    #[test]
    fn atomic_mode_persists_nothing_on_failure() {
        let fx = Fixture::new(2);
        let ids = vec![fx.order[0], InventoryItemId::generate(), fx.order[1]];
        assert!(fx.add(ids, BatchMode::Atomic).is_err());
        assert_eq!(fx.members(), 0);
    }

    #[test]
    fn removing_is_the_inverse() {
        let fx = Fixture::new(2);
        fx.add(fx.order.clone(), BatchMode::FailFast).unwrap();

        assert_eq!(fx.remove(vec![fx.order[0]], BatchMode::FailFast).unwrap(), 1);
        assert_eq!(fx.members(), 1);
        assert_eq!(fx.remove(vec![fx.order[0]], BatchMode::FailFast).unwrap(), 0);

        let err = fx
            .remove(vec![fx.order[1], InventoryItemId::generate()], BatchMode::FailFast)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInventoryItem { .. }));
        assert_eq!(fx.members(), 0);
    }

    #[test]
    fn items_of_other_owners_are_rejected() {
        let fx = Fixture::new(0);
        let stranger = InventoryItem::create(
            InventoryItemId::generate(),
            UserId::new(),
            NewInventoryItem::default(),
            Utc::now(),
        );
        let id = stranger.id_typed();
        fx.items.borrow_mut().insert(id, stranger);

        let err = fx.add(vec![id], BatchMode::FailFast).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Permission);
        assert_eq!(fx.members(), 0);
    }

    #[test]
    fn add_card_creates_a_member_item() {
        let fx = Fixture::new(0);
        let item = fx.inventory.add_card_to_inventory(
            InventoryItemId::generate(),
            NewInventoryItem::default(),
            Utc::now(),
        );
        assert_eq!(item.owner(), fx.inventory.owner());
        assert!(fx.inventory.contains(&item));
    }

    #[test]
    fn kind_views_filter_by_owner_and_kind() {
        let owner = UserId::new();
        let inventory = UserInventory::provision(UserInventoryId::generate(), owner, Utc::now());
        let make = |owner, kind| {
            SubCollection::create(
                SubCollectionId::generate(),
                owner,
                NewSubCollection::of_kind(kind),
                Utc::now(),
            )
        };
        let all = vec![
            make(owner, SubCollectionKind::Cube),
            make(owner, SubCollectionKind::Cube),
            make(owner, SubCollectionKind::Deck),
            make(UserId::new(), SubCollectionKind::Cube),
            make(owner, SubCollectionKind::Other),
        ];

        assert_eq!(inventory.cubes(all.clone()).len(), 2);
        assert_eq!(inventory.decks(all.clone()).len(), 1);
        assert_eq!(inventory.collections(all.clone()).len(), 0);
        assert_eq!(inventory.tradelists(all.clone()).len(), 0);
        assert_eq!(inventory.other_subcollections(all.clone()).len(), 1);
        assert!(inventory.cubes(all).iter().all(|s| s.owner() == owner));
    }

    #[test]
    fn display_name_mentions_owner() {
        let inventory =
            UserInventory::provision(UserInventoryId::generate(), UserId::new(), Utc::now());
        assert_eq!(inventory.display_name("alice"), "alice's Inventory");
    }
}
