//! Batch membership changes (add/remove many items at once).
//!
//! Both sub-collections and the user inventory run their bulk operations
//! through [`run_batch`] so the failure semantics are identical.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use cardboard_core::{DomainError, DomainResult, UserId};

use crate::ids::InventoryItemId;
use crate::item::InventoryItem;

/// How a batch reacts to an id that cannot be resolved.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// Resolve and apply one id at a time; stop at the first unresolved id.
    /// Changes applied before the failure are kept.
    #[default]
    FailFast,
    /// Resolve every id before applying anything; a single unresolved id
    /// leaves membership untouched.
    Atomic,
}

/// Resolve each id and hand the item to `apply`.
///
/// Repeated ids are dropped before anything is resolved (first occurrence
/// wins), so every item is resolved and applied at most once. Returns the
/// number of items whose membership actually changed. A lookup failure is
/// reported as [`DomainError::InvalidInventoryItem`] naming the id.
pub fn run_batch<I, R, A, E>(
    ids: I,
    mode: BatchMode,
    mut resolve: R,
    mut apply: A,
) -> Result<usize, E>
where
    I: IntoIterator<Item = InventoryItemId>,
    R: FnMut(InventoryItemId) -> DomainResult<InventoryItem>,
    A: FnMut(InventoryItem) -> Result<bool, E>,
    E: From<DomainError>,
{
    let mut seen = BTreeSet::new();
    let ids: Vec<InventoryItemId> = ids.into_iter().filter(|id| seen.insert(*id)).collect();

    let mut resolve_one = |id: InventoryItemId| -> Result<InventoryItem, E> {
        resolve(id).map_err(|err| E::from(DomainError::invalid_item(id, err)))
    };

    let mut changed = 0;
    match mode {
        BatchMode::FailFast => {
            for id in ids {
                let item = resolve_one(id)?;
                if apply(item)? {
                    changed += 1;
                }
            }
        }
        BatchMode::Atomic => {
            let items = ids
                .into_iter()
                .map(&mut resolve_one)
                .collect::<Result<Vec<_>, E>>()?;
            for item in items {
                if apply(item)? {
                    changed += 1;
                }
            }
        }
    }
    Ok(changed)
}

/// Wrap a resolver so items owned by anyone but `owner` are rejected.
pub(crate) fn owned_by<R>(
    owner: UserId,
    mut resolve: R,
) -> impl FnMut(InventoryItemId) -> DomainResult<InventoryItem>
where
    R: FnMut(InventoryItemId) -> DomainResult<InventoryItem>,
{
    move |id| {
        let item = resolve(id)?;
        if item.owner() != owner {
            return Err(DomainError::forbidden(format!(
                "inventory item {id} belongs to another user"
            )));
        }
        Ok(item)
    }
}
