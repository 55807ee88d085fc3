use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use cardboard_auth::User;
use cardboard_core::{AggregateRoot, ExpectedVersion, UserId};
use cardboard_inventory::{
    CardId, GradingDetails, GradingDetailsId, InventoryItem, InventoryItemId, SubCollection,
    SubCollectionId, SubCollectionKind, UserInventory, UserInventoryId,
};

use super::r#trait::{CascadeReport, InventoryStore, ItemFilter, StoreError, StoreResult};

/// A stored record plus its insertion position (lists come back in insert order).
#[derive(Debug, Clone)]
struct Row<T> {
    seq: u64,
    value: T,
}

#[derive(Debug, Default)]
struct Tables {
    next_seq: u64,
    users: HashMap<UserId, User>,
    inventories: HashMap<UserInventoryId, Row<UserInventory>>,
    items: HashMap<InventoryItemId, Row<InventoryItem>>,
    grading: HashMap<GradingDetailsId, GradingDetails>,
    subcollections: HashMap<SubCollectionId, Row<SubCollection>>,
}

impl Tables {
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

fn insert_row<T>(table: &mut HashMap<T::Id, Row<T>>, seq: u64, value: &mut T) -> StoreResult<()>
where
    T: AggregateRoot + Clone,
    T::Id: core::fmt::Display,
{
    let id = value.id().clone();
    if table.contains_key(&id) {
        return Err(StoreError::Duplicate(format!("record {id} already exists")));
    }
    value.set_version(1);
    table.insert(
        id,
        Row {
            seq,
            value: value.clone(),
        },
    );
    Ok(())
}

fn update_row<T>(
    table: &mut HashMap<T::Id, Row<T>>,
    value: &mut T,
    expected: ExpectedVersion,
) -> StoreResult<()>
where
    T: AggregateRoot + Clone,
    T::Id: core::fmt::Display,
{
    let id = value.id().clone();
    let row = table
        .get_mut(&id)
        .ok_or_else(|| StoreError::Missing(format!("record {id}")))?;
    let current = row.value.version();
    if !expected.matches(current) {
        return Err(StoreError::Concurrency(format!(
            "record {id}: expected {expected:?}, found {current}"
        )));
    }
    value.set_version(current + 1);
    row.value = value.clone();
    Ok(())
}

/// Bump a record that the store itself modified (cascades, link clearing).
fn touch<T: AggregateRoot>(value: &mut T) {
    let next = value.version() + 1;
    value.set_version(next);
}

fn in_order<'a, K, T>(table: &'a HashMap<K, Row<T>>, keep: impl Fn(&T) -> bool) -> Vec<T>
where
    K: Eq + Hash,
    T: Clone + 'a,
{
    let mut rows: Vec<&Row<T>> = table.values().filter(|r| keep(&r.value)).collect();
    rows.sort_by_key(|r| r.seq);
    rows.into_iter().map(|r| r.value.clone()).collect()
}

/// In-memory store for tests/dev.
///
/// All tables sit behind one lock, so every method is trivially atomic.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

fn forget_everywhere(tables: &mut Tables, item: InventoryItemId) {
    for row in tables.subcollections.values_mut() {
        if row.value.forget_item(item) {
            touch(&mut row.value);
        }
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn insert_user(&self, user: User) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.users.contains_key(&user.id) {
            return Err(StoreError::Duplicate(format!("user {} already exists", user.id)));
        }
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(format!("username '{}' is taken", user.username)));
        }
        tables.users.insert(user.id, user);
        Ok(())
    }

    fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    fn delete_user(&self, id: UserId) -> StoreResult<Option<CascadeReport>> {
        let mut tables = self.write()?;
        if tables.users.remove(&id).is_none() {
            return Ok(None);
        }

        let mut report = CascadeReport::default();

        let before = tables.inventories.len();
        tables.inventories.retain(|_, r| r.value.owner() != id);
        report.inventories = before - tables.inventories.len();

        let before = tables.subcollections.len();
        tables.subcollections.retain(|_, r| r.value.owner() != id);
        report.subcollections = before - tables.subcollections.len();

        let owned: Vec<InventoryItem> = tables
            .items
            .values()
            .filter(|r| r.value.owner() == id)
            .map(|r| r.value.clone())
            .collect();
        for item in &owned {
            tables.items.remove(&item.id_typed());
            if let Some(details) = item.grading_details() {
                if tables.grading.remove(&details).is_some() {
                    report.grading_details += 1;
                }
            }
            forget_everywhere(&mut tables, item.id_typed());
        }
        report.items = owned.len();

        Ok(Some(report))
    }

    fn provision_inventory(&self, inventory: &mut UserInventory) -> StoreResult<()> {
        let mut tables = self.write()?;
        let owner = inventory.owner();
        if tables.inventories.values().any(|r| r.value.owner() == owner) {
            return Err(StoreError::Duplicate(format!("user {owner} already has an inventory")));
        }
        let seq = tables.seq();
        insert_row(&mut tables.inventories, seq, inventory)
    }

    fn get_inventory(&self, id: UserInventoryId) -> StoreResult<Option<UserInventory>> {
        Ok(self.read()?.inventories.get(&id).map(|r| r.value.clone()))
    }

    fn inventory_for_owner(&self, owner: UserId) -> StoreResult<Option<UserInventory>> {
        Ok(self
            .read()?
            .inventories
            .values()
            .find(|r| r.value.owner() == owner)
            .map(|r| r.value.clone()))
    }

    fn delete_inventory(&self, id: UserInventoryId) -> StoreResult<Option<UserInventory>> {
        let mut tables = self.write()?;
        let Some(removed) = tables.inventories.remove(&id) else {
            return Ok(None);
        };
        for row in tables.items.values_mut() {
            if row.value.leave_inventory(id) {
                touch(&mut row.value);
            }
        }
        Ok(Some(removed.value))
    }

    fn insert_item(&self, item: &mut InventoryItem) -> StoreResult<()> {
        let mut tables = self.write()?;
        let seq = tables.seq();
        insert_row(&mut tables.items, seq, item)
    }

    fn get_item(&self, id: InventoryItemId) -> StoreResult<Option<InventoryItem>> {
        Ok(self.read()?.items.get(&id).map(|r| r.value.clone()))
    }

    fn update_item(&self, item: &mut InventoryItem, expected: ExpectedVersion) -> StoreResult<()> {
        update_row(&mut self.write()?.items, item, expected)
    }

    fn delete_item(&self, id: InventoryItemId) -> StoreResult<Option<InventoryItem>> {
        let mut tables = self.write()?;
        let Some(removed) = tables.items.remove(&id) else {
            return Ok(None);
        };
        if let Some(details) = removed.value.grading_details() {
            tables.grading.remove(&details);
        }
        forget_everywhere(&mut tables, id);
        Ok(Some(removed.value))
    }

    fn list_items(&self, filter: ItemFilter) -> StoreResult<Vec<InventoryItem>> {
        Ok(in_order(&self.read()?.items, |item| filter.matches(item)))
    }

    fn clear_card(&self, card: CardId) -> StoreResult<usize> {
        let mut tables = self.write()?;
        let mut cleared = 0;
        for row in tables.items.values_mut() {
            if row.value.card() == Some(card) {
                row.value.clear_card();
                touch(&mut row.value);
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    fn attach_grading(
        &self,
        item: &mut InventoryItem,
        details: GradingDetails,
        replaced: Option<GradingDetailsId>,
        expected: ExpectedVersion,
    ) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.grading.contains_key(&details.id) {
            return Err(StoreError::Duplicate(format!(
                "grading details {} already exist",
                details.id
            )));
        }
        // Item write first: a version conflict must leave grading untouched.
        update_row(&mut tables.items, item, expected)?;
        if let Some(old) = replaced {
            tables.grading.remove(&old);
        }
        tables.grading.insert(details.id, details);
        Ok(())
    }

    fn get_grading_details(&self, id: GradingDetailsId) -> StoreResult<Option<GradingDetails>> {
        Ok(self.read()?.grading.get(&id).cloned())
    }

    fn insert_subcollection(&self, subcollection: &mut SubCollection) -> StoreResult<()> {
        let mut tables = self.write()?;
        let seq = tables.seq();
        insert_row(&mut tables.subcollections, seq, subcollection)
    }

    fn get_subcollection(&self, id: SubCollectionId) -> StoreResult<Option<SubCollection>> {
        Ok(self.read()?.subcollections.get(&id).map(|r| r.value.clone()))
    }

    fn update_subcollection(
        &self,
        subcollection: &mut SubCollection,
        expected: ExpectedVersion,
    ) -> StoreResult<()> {
        update_row(&mut self.write()?.subcollections, subcollection, expected)
    }

    fn delete_subcollection(&self, id: SubCollectionId) -> StoreResult<Option<SubCollection>> {
        Ok(self.write()?.subcollections.remove(&id).map(|r| r.value))
    }

    fn list_subcollections(
        &self,
        owner: UserId,
        kind: Option<SubCollectionKind>,
    ) -> StoreResult<Vec<SubCollection>> {
        Ok(in_order(&self.read()?.subcollections, |s| {
            s.owner() == owner && kind.is_none_or(|k| s.kind() == k)
        }))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use cardboard_inventory::{GradingPayload, GradingService, NewInventoryItem, NewSubCollection};

    fn item(owner: UserId) -> InventoryItem {
        InventoryItem::create(
            InventoryItemId::generate(),
            owner,
            NewInventoryItem::for_card(CardId::generate()),
            Utc::now(),
        )
    }

    fn grading(serial: &str) -> GradingDetails {
        let payload = GradingPayload {
            grading_service: GradingService::ProfessionalSportsAuthentication,
            serial_number: serial.to_string(),
            overall_grade: None,
            autograph_grade: None,
            centering_grade: None,
            corners_grade: None,
            edges_grade: None,
            surface_grade: None,
        };
        GradingDetails::from_payload(GradingDetailsId::generate(), payload, Utc::now())
    }

    #[test]
    fn inserts_assign_version_one_and_updates_bump() {
        let store = InMemoryInventoryStore::new();
        let mut it = item(UserId::new());
        store.insert_item(&mut it).unwrap();
        assert_eq!(it.version(), 1);

        let expected = it.expected_version();
        store.update_item(&mut it, expected).unwrap();
        assert_eq!(it.version(), 2);
        assert_eq!(store.get_item(it.id_typed()).unwrap().unwrap().version(), 2);
    }

    #[test]
    fn stale_writes_are_rejected() {
        let store = InMemoryInventoryStore::new();
        let mut it = item(UserId::new());
        store.insert_item(&mut it).unwrap();
        let mut stale = it.clone();

        store.update_item(&mut it, ExpectedVersion::Exact(1)).unwrap();
        let err = store.update_item(&mut stale, ExpectedVersion::Exact(1)).unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));
    }

    #[test]
    fn one_inventory_per_owner() {
        let store = InMemoryInventoryStore::new();
        let owner = UserId::new();
        let mut first = UserInventory::provision(UserInventoryId::generate(), owner, Utc::now());
        let mut second = UserInventory::provision(UserInventoryId::generate(), owner, Utc::now());

        store.provision_inventory(&mut first).unwrap();
        let err = store.provision_inventory(&mut second).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.inventory_for_owner(owner).unwrap(), Some(first));
    }

    #[test]
    fn sub_collections_list_in_insertion_order() {
        let store = InMemoryInventoryStore::new();
        let owner = UserId::new();
        let mut ids = Vec::new();
        for kind in [SubCollectionKind::Deck, SubCollectionKind::Cube, SubCollectionKind::Deck] {
            let mut sub = SubCollection::create(
                SubCollectionId::generate(),
                owner,
                NewSubCollection::of_kind(kind),
                Utc::now(),
            );
            store.insert_subcollection(&mut sub).unwrap();
            ids.push(sub.id_typed());
        }

        let decks: Vec<_> = store
            .list_subcollections(owner, Some(SubCollectionKind::Deck))
            .unwrap()
            .iter()
            .map(SubCollection::id_typed)
            .collect();
        assert_eq!(decks, vec![ids[0], ids[2]]);
        assert_eq!(store.list_subcollections(owner, None).unwrap().len(), 3);
        assert!(store.list_subcollections(UserId::new(), None).unwrap().is_empty());
    }

    #[test]
    fn clearing_a_card_keeps_items() {
        let store = InMemoryInventoryStore::new();
        let mut it = item(UserId::new());
        let card = it.card().unwrap();
        store.insert_item(&mut it).unwrap();

        assert_eq!(store.clear_card(card).unwrap(), 1);
        let reloaded = store.get_item(it.id_typed()).unwrap().unwrap();
        assert_eq!(reloaded.card(), None);
        assert_eq!(reloaded.version(), 2);
    }

    #[test]
    fn stale_grading_attach_leaves_item_and_details_untouched() {
        let store = InMemoryInventoryStore::new();
        let mut it = item(UserId::new());
        store.insert_item(&mut it).unwrap();

        let first = grading("A1");
        let expected = it.expected_version();
        let replaced = it.attach_grading(&first);
        store
            .attach_grading(&mut it, first.clone(), replaced, expected)
            .unwrap();

        // another writer moves the item on after `stale` was loaded
        let mut stale = store.get_item(it.id_typed()).unwrap().unwrap();
        store.update_item(&mut it, ExpectedVersion::Exact(2)).unwrap();
        let current = store.get_item(it.id_typed()).unwrap().unwrap();

        let second = grading("B2");
        let expected = stale.expected_version();
        let replaced = stale.attach_grading(&second);
        let err = store
            .attach_grading(&mut stale, second.clone(), replaced, expected)
            .unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));

        assert_eq!(store.get_grading_details(second.id).unwrap(), None);
        assert_eq!(store.get_grading_details(first.id).unwrap(), Some(first.clone()));
        let after = store.get_item(it.id_typed()).unwrap().unwrap();
        assert_eq!(after, current);
        assert!(after.is_graded());
        assert_eq!(after.grading_details(), Some(first.id));
    }

    #[test]
    fn stale_first_grading_does_not_mark_the_item_graded() {
        let store = InMemoryInventoryStore::new();
        let mut it = item(UserId::new());
        store.insert_item(&mut it).unwrap();
        let mut stale = it.clone();
        store.update_item(&mut it, ExpectedVersion::Exact(1)).unwrap();

        let details = grading("C3");
        let expected = stale.expected_version();
        let replaced = stale.attach_grading(&details);
        assert!(store
            .attach_grading(&mut stale, details.clone(), replaced, expected)
            .is_err());

        assert_eq!(store.get_grading_details(details.id).unwrap(), None);
        let after = store.get_item(it.id_typed()).unwrap().unwrap();
        assert!(!after.is_graded());
        assert_eq!(after.grading_details(), None);
        assert_eq!(after.version(), 2);
    }
}
