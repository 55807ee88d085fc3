//! Inventory item: one owned unit of a catalog card.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use cardboard_core::{AggregateRoot, DomainResult, Entity, UserId};

use crate::choices::{Condition, Language};
use crate::grading::GradingDetails;
use crate::ids::{CardId, GradingDetailsId, InventoryItemId, UserInventoryId};
use crate::payload::{Field, JsonFields};

/// Label used when the card reference is empty or cannot be resolved.
pub const UNKNOWN_CARD: &str = "Unknown Card";

/// Independent yes/no attributes of an item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemFlags {
    pub is_foil: bool,
    pub is_signed: bool,
    pub is_altered: bool,
    pub is_misprint: bool,
    pub is_miscut: bool,
}

impl ItemFlags {
    /// Display words of the set flags, in label order.
    pub fn words(&self) -> impl Iterator<Item = &'static str> {
        [
            (self.is_foil, "Foil"),
            (self.is_signed, "Signed"),
            (self.is_altered, "Altered"),
            (self.is_misprint, "Misprint"),
            (self.is_miscut, "Miscut"),
        ]
        .into_iter()
        .filter_map(|(set, word)| set.then_some(word))
    }
}

/// Input for creating an item. `Default` carries the documented defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInventoryItem {
    pub card: Option<CardId>,
    pub quantity_owned: u32,
    pub quantity_wanted: Option<u32>,
    pub condition: Condition,
    pub language: Language,
    pub flags: ItemFlags,
    pub is_graded: bool,
}

impl Default for NewInventoryItem {
    fn default() -> Self {
        Self {
            card: None,
            quantity_owned: 0,
            quantity_wanted: Some(0),
            condition: Condition::default(),
            language: Language::default(),
            flags: ItemFlags::default(),
            is_graded: false,
        }
    }
}

impl NewInventoryItem {
    pub fn for_card(card: CardId) -> Self {
        Self {
            card: Some(card),
            ..Self::default()
        }
    }

    /// Parse card data, applying defaults for omitted fields.
    ///
    /// Every type-incompatible field is reported in a single validation error.
    pub fn from_json(value: &Value) -> DomainResult<Self> {
        let changes = ItemChanges::from_json(value)?;
        let mut new = Self::default();
        if let Some(card) = changes.card {
            new.card = card;
        }
        if let Some(owned) = changes.quantity_owned {
            new.quantity_owned = owned;
        }
        if let Some(wanted) = changes.quantity_wanted {
            new.quantity_wanted = wanted;
        }
        if let Some(condition) = changes.condition {
            new.condition = condition;
        }
        if let Some(language) = changes.language {
            new.language = language;
        }
        changes.apply_flags(&mut new.flags);
        if let Some(graded) = changes.is_graded {
            new.is_graded = graded;
        }
        Ok(new)
    }
}

/// Partial update of an item's attributes; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    pub card: Option<Option<CardId>>,
    pub quantity_owned: Option<u32>,
    pub quantity_wanted: Option<Option<u32>>,
    pub condition: Option<Condition>,
    pub language: Option<Language>,
    pub is_foil: Option<bool>,
    pub is_signed: Option<bool>,
    pub is_altered: Option<bool>,
    pub is_misprint: Option<bool>,
    pub is_miscut: Option<bool>,
    pub is_graded: Option<bool>,
}

impl ItemChanges {
    pub fn from_json(value: &Value) -> DomainResult<Self> {
        let mut fields = JsonFields::parse(value)?;
        let changes = Self {
            card: fields.card("card").into_option(),
            quantity_owned: match fields.count("quantity_owned", false) {
                Field::Set(n) => Some(n),
                _ => None,
            },
            quantity_wanted: fields.count("quantity_wanted", true).into_option(),
            condition: fields.choice("condition"),
            language: fields.choice("language"),
            is_foil: fields.bool("is_foil"),
            is_signed: fields.bool("is_signed"),
            is_altered: fields.bool("is_altered"),
            is_misprint: fields.bool("is_misprint"),
            is_miscut: fields.bool("is_miscut"),
            is_graded: fields.bool("is_graded"),
        };
        fields.finish()?;
        Ok(changes)
    }

    fn apply_flags(&self, flags: &mut ItemFlags) {
        let pairs = [
            (self.is_foil, &mut flags.is_foil),
            (self.is_signed, &mut flags.is_signed),
            (self.is_altered, &mut flags.is_altered),
            (self.is_misprint, &mut flags.is_misprint),
            (self.is_miscut, &mut flags.is_miscut),
        ];
        for (change, slot) in pairs {
            if let Some(value) = change {
                *slot = value;
            }
        }
    }
}

/// Aggregate root: InventoryItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    id: InventoryItemId,
    owner: UserId,
    card: Option<CardId>,
    quantity_owned: u32,
    quantity_wanted: Option<u32>,
    condition: Condition,
    language: Language,
    flags: ItemFlags,
    is_graded: bool,
    grading_details: Option<GradingDetailsId>,
    inventory: Option<UserInventoryId>,
    created_at: DateTime<Utc>,
    version: u64,
}

impl InventoryItem {
    pub fn create(
        id: InventoryItemId,
        owner: UserId,
        new: NewInventoryItem,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            card: new.card,
            quantity_owned: new.quantity_owned,
            quantity_wanted: new.quantity_wanted,
            condition: new.condition,
            language: new.language,
            flags: new.flags,
            is_graded: new.is_graded,
            grading_details: None,
            inventory: None,
            created_at: now,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> InventoryItemId {
        self.id
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn card(&self) -> Option<CardId> {
        self.card
    }

    pub fn quantity_owned(&self) -> u32 {
        self.quantity_owned
    }

    pub fn quantity_wanted(&self) -> Option<u32> {
        self.quantity_wanted
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn flags(&self) -> ItemFlags {
        self.flags
    }

    pub fn is_graded(&self) -> bool {
        self.is_graded
    }

    pub fn grading_details(&self) -> Option<GradingDetailsId> {
        self.grading_details
    }

    pub fn inventory(&self) -> Option<UserInventoryId> {
        self.inventory
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn apply_changes(&mut self, changes: &ItemChanges) {
        if let Some(card) = changes.card {
            self.card = card;
        }
        if let Some(owned) = changes.quantity_owned {
            self.quantity_owned = owned;
        }
        if let Some(wanted) = changes.quantity_wanted {
            self.quantity_wanted = wanted;
        }
        if let Some(condition) = changes.condition {
            self.condition = condition;
        }
        if let Some(language) = changes.language {
            self.language = language;
        }
        changes.apply_flags(&mut self.flags);
        if let Some(graded) = changes.is_graded {
            self.is_graded = graded;
        }
    }

    /// Link freshly created grading details and mark the item graded.
    ///
    /// Returns the previously linked details, which the caller discards.
    pub fn attach_grading(&mut self, details: &GradingDetails) -> Option<GradingDetailsId> {
        self.is_graded = true;
        self.grading_details.replace(details.id)
    }

    /// The catalog entry went away: keep the item, drop the link.
    pub fn clear_card(&mut self) {
        self.card = None;
    }

    /// Point the item at its owner's inventory. Returns `true` if membership changed.
    pub fn join_inventory(&mut self, inventory: UserInventoryId) -> bool {
        self.inventory.replace(inventory) != Some(inventory)
    }

    /// Returns `true` if the item was a member of `inventory`.
    pub fn leave_inventory(&mut self, inventory: UserInventoryId) -> bool {
        if self.inventory == Some(inventory) {
            self.inventory = None;
            true
        } else {
            false
        }
    }

    /// Human-readable label, e.g. `NM Arid Mesa Foil` or `9.5 B Arid Mesa Signed`.
    ///
    /// `grading` is consulted only when the item is graded; without a usable
    /// overall grade the condition code is shown instead.
    pub fn label(&self, card_name: Option<&str>, grading: Option<&GradingDetails>) -> String {
        let prefix = grading
            .filter(|_| self.is_graded)
            .and_then(GradingDetails::grade_label)
            .unwrap_or_else(|| self.condition.code().to_string());

        let mut label = format!("{prefix} {}", card_name.unwrap_or(UNKNOWN_CARD));
        for word in self.flags.words() {
            label.push(' ');
            label.push_str(word);
        }
        label
    }
}

impl Entity for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for InventoryItem {
    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
