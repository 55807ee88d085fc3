//! Sub-collection: a named, typed grouping of a user's items.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use cardboard_core::{AggregateRoot, DomainError, DomainResult, Entity, UserId};

use crate::ids::{InventoryItemId, SubCollectionId};
use crate::item::InventoryItem;
use crate::membership::{BatchMode, owned_by, run_batch};
use crate::payload::JsonFields;

pub const KIND_OVERRIDE_MAX_LEN: usize = 56;
pub const DESCRIPTION_MAX_LEN: usize = 256;

/// Kind of grouping.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubCollectionKind {
    Cube,
    Deck,
    Collection,
    Tradelist,
    Other,
}

impl SubCollectionKind {
    pub const ALL: [SubCollectionKind; 5] = [
        SubCollectionKind::Cube,
        SubCollectionKind::Deck,
        SubCollectionKind::Collection,
        SubCollectionKind::Tradelist,
        SubCollectionKind::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SubCollectionKind::Cube => "cube",
            SubCollectionKind::Deck => "deck",
            SubCollectionKind::Collection => "collection",
            SubCollectionKind::Tradelist => "tradelist",
            SubCollectionKind::Other => "other",
        }
    }
}

impl core::fmt::Display for SubCollectionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts both the stored value (`cube`) and the choice key (`CUBE`).
impl FromStr for SubCollectionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        SubCollectionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == lowered)
            .ok_or_else(|| DomainError::validation("kind", crate::choices::invalid_choice(s)))
    }
}

/// Input for creating a sub-collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubCollection {
    pub kind: SubCollectionKind,
    pub kind_override: Option<String>,
    pub description: Option<String>,
}

impl NewSubCollection {
    pub fn of_kind(kind: SubCollectionKind) -> Self {
        Self {
            kind,
            kind_override: None,
            description: None,
        }
    }

    pub fn from_json(value: &Value) -> DomainResult<Self> {
        let mut fields = JsonFields::parse(value)?;
        fields.require("kind");
        let kind = fields.choice::<SubCollectionKind>("kind");
        let kind_override = fields
            .string("kind_override", KIND_OVERRIDE_MAX_LEN, true)
            .into_option()
            .flatten();
        let description = fields
            .string("description", DESCRIPTION_MAX_LEN, true)
            .into_option()
            .flatten();
        fields.finish()?;

        let kind = kind.ok_or_else(|| DomainError::validation("kind", "This field is required."))?;
        Ok(Self {
            kind,
            kind_override,
            description,
        })
    }
}

/// Partial update of a sub-collection's descriptive fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubCollectionChanges {
    pub kind: Option<SubCollectionKind>,
    pub kind_override: Option<Option<String>>,
    pub description: Option<Option<String>>,
}

impl SubCollectionChanges {
    pub fn from_json(value: &Value) -> DomainResult<Self> {
        let mut fields = JsonFields::parse(value)?;
        let kind = fields.choice::<SubCollectionKind>("kind");
        let kind_override = fields
            .string("kind_override", KIND_OVERRIDE_MAX_LEN, true)
            .into_option();
        let description = fields.string("description", DESCRIPTION_MAX_LEN, true).into_option();
        fields.finish()?;
        Ok(Self {
            kind,
            kind_override,
            description,
        })
    }
}

/// Aggregate root: SubCollection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCollection {
    id: SubCollectionId,
    owner: UserId,
    kind: SubCollectionKind,
    kind_override: Option<String>,
    description: Option<String>,
    items: BTreeSet<InventoryItemId>,
    created_at: DateTime<Utc>,
    version: u64,
}

impl SubCollection {
    pub fn create(
        id: SubCollectionId,
        owner: UserId,
        new: NewSubCollection,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            kind: new.kind,
            kind_override: new.kind_override,
            description: new.description,
            items: BTreeSet::new(),
            created_at: now,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> SubCollectionId {
        self.id
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn kind(&self) -> SubCollectionKind {
        self.kind
    }

    pub fn kind_override(&self) -> Option<&str> {
        self.kind_override.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn items(&self) -> &BTreeSet<InventoryItemId> {
        &self.items
    }

    pub fn contains(&self, item: InventoryItemId) -> bool {
        self.items.contains(&item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Kind shown to users: the override for `Other`, the kind otherwise.
    pub fn display_kind(&self) -> &str {
        match (self.kind, self.kind_override.as_deref()) {
            (SubCollectionKind::Other, Some(name)) => name,
            (kind, _) => kind.as_str(),
        }
    }

    /// E.g. `alice's cube`.
    pub fn display_name(&self, owner_username: &str) -> String {
        format!("{owner_username}'s {}", self.display_kind())
    }

    pub fn apply_changes(&mut self, changes: SubCollectionChanges) {
        if let Some(kind) = changes.kind {
            self.kind = kind;
        }
        if let Some(kind_override) = changes.kind_override {
            self.kind_override = kind_override;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
    }

    /// Add items to this sub-collection.
    ///
    /// Only the owner's items can be added. Adding a member again is a no-op.
    /// In [`BatchMode::FailFast`] items added before an unresolved id stay in
    /// `self` even though an error is returned; the caller persists `self`
    /// either way.
    pub fn add_items<I, R>(&mut self, ids: I, mode: BatchMode, resolve: R) -> DomainResult<usize>
    where
        I: IntoIterator<Item = InventoryItemId>,
        R: FnMut(InventoryItemId) -> DomainResult<InventoryItem>,
    {
        let resolve = owned_by(self.owner, resolve);
        run_batch(ids, mode, resolve, |item| {
            Ok::<_, DomainError>(self.items.insert(item.id_typed()))
        })
    }

    /// Remove items from this sub-collection. Removing a non-member is a no-op.
    ///
    /// Same failure semantics as [`SubCollection::add_items`].
    pub fn remove_items<I, R>(&mut self, ids: I, mode: BatchMode, resolve: R) -> DomainResult<usize>
    where
        I: IntoIterator<Item = InventoryItemId>,
        R: FnMut(InventoryItemId) -> DomainResult<InventoryItem>,
    {
        let resolve = owned_by(self.owner, resolve);
        run_batch(ids, mode, resolve, |item| {
            Ok::<_, DomainError>(self.items.remove(&item.id_typed()))
        })
    }

    /// Drop a deleted item without resolving it.
    pub fn forget_item(&mut self, item: InventoryItemId) -> bool {
        self.items.remove(&item)
    }
}

impl Entity for SubCollection {
    type Id = SubCollectionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for SubCollection {
    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::item::NewInventoryItem;

    fn test_owner() -> UserId {
        UserId::new()
    }

    fn items_for(owner: UserId, n: usize) -> HashMap<InventoryItemId, InventoryItem> {
        (0..n)
            .map(|_| {
                let item = InventoryItem::create(
                    InventoryItemId::generate(),
                    owner,
                    NewInventoryItem::default(),
                    Utc::now(),
                );
                (item.id_typed(), item)
            })
            .collect()
    }

    fn lookup(
        items: &HashMap<InventoryItemId, InventoryItem>,
    ) -> impl FnMut(InventoryItemId) -> DomainResult<InventoryItem> + '_ {
        move |id| {
            items
                .get(&id)
                .cloned()
                .ok_or_else(|| DomainError::not_found("inventory item", id))
        }
    }

    fn collection(owner: UserId, kind: SubCollectionKind) -> SubCollection {
        SubCollection::create(
            SubCollectionId::generate(),
            owner,
            NewSubCollection::of_kind(kind),
            Utc::now(),
        )
    }

    #[test]
    fn add_items_grows_membership_and_is_idempotent() {
        let owner = test_owner();
        let items = items_for(owner, 2);
        let ids: Vec<_> = items.keys().copied().collect();
        let mut sub = collection(owner, SubCollectionKind::Collection);

        assert_eq!(sub.add_items(ids.clone(), BatchMode::FailFast, lookup(&items)).unwrap(), 2);
        assert_eq!(sub.len(), 2);

        assert_eq!(sub.add_items(ids, BatchMode::FailFast, lookup(&items)).unwrap(), 0);
        assert_eq!(sub.len(), 2);
    }

    #[test]
    fn fail_fast_keeps_items_added_before_the_bad_id() {
        let owner = test_owner();
        let items = items_for(owner, 2);
        let mut ids: Vec<_> = items.keys().copied().collect();
        let missing = InventoryItemId::generate();
        ids.insert(1, missing);
        let mut sub = collection(owner, SubCollectionKind::Deck);

        let err = sub.add_items(ids.clone(), BatchMode::FailFast, lookup(&items)).unwrap_err();

        assert_eq!(err.offending_item(), Some(missing.to_string().as_str()));
        assert!(sub.contains(ids[0]));
        assert!(!sub.contains(ids[2]));
        assert_eq!(sub.len(), 1);
    }

    #[test]
    fn atomic_mode_leaves_membership_untouched_on_failure() {
        let owner = test_owner();
        let items = items_for(owner, 2);
        let mut ids: Vec<_> = items.keys().copied().collect();
        ids.push(InventoryItemId::generate());
        let mut sub = collection(owner, SubCollectionKind::Cube);

        assert!(sub.add_items(ids, BatchMode::Atomic, lookup(&items)).is_err());
        assert!(sub.is_empty());
    }

    #[test]
    fn remove_items_is_the_inverse() {
        let owner = test_owner();
        let items = items_for(owner, 3);
        let ids: Vec<_> = items.keys().copied().collect();
        let mut sub = collection(owner, SubCollectionKind::Tradelist);
        sub.add_items(ids[..2].to_vec(), BatchMode::FailFast, lookup(&items)).unwrap();

        // ids[2] is not a member: no-op
        assert_eq!(sub.remove_items(vec![ids[2]], BatchMode::FailFast, lookup(&items)).unwrap(), 0);
        assert_eq!(sub.len(), 2);

        assert_eq!(sub.remove_items(vec![ids[0]], BatchMode::FailFast, lookup(&items)).unwrap(), 1);
        assert_eq!(sub.len(), 1);

        let missing = InventoryItemId::generate();
        let err = sub
            .remove_items(vec![ids[1], missing], BatchMode::FailFast, lookup(&items))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInventoryItem { .. }));
        assert!(sub.is_empty());
    }

    #[test]
    fn items_of_another_owner_cannot_be_added() {
        let items = items_for(test_owner(), 1);
        let ids: Vec<_> = items.keys().copied().collect();
        let mut sub = collection(test_owner(), SubCollectionKind::Cube);

        let err = sub.add_items(ids, BatchMode::FailFast, lookup(&items)).unwrap_err();
        assert_eq!(err.kind(), cardboard_core::ErrorKind::Permission);
        assert!(sub.is_empty());
    }

    #[test]
    fn display_name_uses_override_only_for_other() {
        let owner = test_owner();
        let mut sub = collection(owner, SubCollectionKind::Cube);
        assert_eq!(sub.display_name("alice"), "alice's cube");

        sub.apply_changes(SubCollectionChanges {
            kind_override: Some(Some("binder".to_string())),
            ..SubCollectionChanges::default()
        });
        assert_eq!(sub.display_name("alice"), "alice's cube");

        sub.apply_changes(SubCollectionChanges {
            kind: Some(SubCollectionKind::Other),
            ..SubCollectionChanges::default()
        });
        assert_eq!(sub.display_name("alice"), "alice's binder");
    }

    #[test]
    fn new_sub_collection_requires_a_known_kind() {
        assert!(NewSubCollection::from_json(&json!({})).is_err());
        assert!(NewSubCollection::from_json(&json!({ "kind": "binder" })).is_err());

        let new = NewSubCollection::from_json(&json!({
            "kind": "OTHER",
            "kind_override": "binder",
            "description": "rares",
        }))
        .unwrap();
        assert_eq!(new.kind, SubCollectionKind::Other);
        assert_eq!(new.kind_override.as_deref(), Some("binder"));
    }
}
