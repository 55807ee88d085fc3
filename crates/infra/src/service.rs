//! Inventory application service (request-scoped orchestration).
//!
//! Every operation follows the same pipeline:
//!
//! ```text
//! load target (NotFound) → ownership check (Forbidden) → domain logic → persist
//! ```
//!
//! The service owns no state besides its collaborators; all data lives in the
//! injected [`InventoryStore`].

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use cardboard_auth::{Access, Authorizer, OwnerPolicy, Principal, User};
use cardboard_core::{AggregateRoot, DomainError, DomainResult, UserId};
use cardboard_inventory::{
    CardId, Catalog, GradingDetails, GradingDetailsId, GradingPayload, InventoryItem,
    InventoryItemId, ItemChanges, NewInventoryItem, NewSubCollection, SubCollection,
    SubCollectionChanges, SubCollectionId, SubCollectionKind, UserInventory, UserInventoryId,
};

use crate::config::Settings;
use crate::error::{ServiceError, ServiceResult};
use crate::store::{CascadeReport, InventoryStore, ItemFilter, StoreError};

const INVENTORY: &str = "inventory";
const ITEM: &str = "inventory item";
const SUBCOLLECTION: &str = "sub-collection";
const USER: &str = "user";

pub struct InventoryService<S, C, A = OwnerPolicy> {
    store: S,
    catalog: C,
    authz: A,
    settings: Settings,
}

impl<S, C> InventoryService<S, C>
where
    S: InventoryStore,
    C: Catalog,
{
    /// Service with the default ownership policy.
    pub fn new(store: S, catalog: C, settings: Settings) -> Self {
        Self::with_authorizer(store, catalog, OwnerPolicy, settings)
    }
}

impl<S, C, A> InventoryService<S, C, A>
where
    S: InventoryStore,
    C: Catalog,
    A: Authorizer,
{
    pub fn with_authorizer(store: S, catalog: C, authz: A, settings: Settings) -> Self {
        Self {
            store,
            catalog,
            authz,
            settings,
        }
    }

    // ---- users ---------------------------------------------------------

    /// Record a user supplied by the identity collaborator.
    ///
    /// With auto-provisioning enabled the user's inventory is created as well.
    #[instrument(skip(self, user), fields(user = %user.id, username = %user.username), err)]
    pub fn register_user(&self, user: User) -> ServiceResult<User> {
        user.validate()?;
        self.store.insert_user(user.clone())?;
        info!("user registered");

        if self.settings.auto_provision {
            let mut inventory =
                UserInventory::provision(UserInventoryId::generate(), user.id, Utc::now());
            self.store.provision_inventory(&mut inventory)?;
            info!(inventory = %inventory.id_typed(), "inventory provisioned");
        }
        Ok(user)
    }

    /// Delete a user together with everything they own.
    #[instrument(skip(self, principal), fields(principal = %principal.user_id, user = %user), err)]
    pub fn delete_user(&self, principal: &Principal, user: UserId) -> ServiceResult<CascadeReport> {
        self.load_user(user)?;
        self.guard(principal, user, USER, Access::Write)?;

        let report = self
            .store
            .delete_user(user)?
            .ok_or_else(|| DomainError::not_found(USER, user))?;
        info!(
            inventories = report.inventories,
            subcollections = report.subcollections,
            items = report.items,
            grading_details = report.grading_details,
            "user deleted"
        );
        Ok(report)
    }

    // ---- inventory -----------------------------------------------------

    /// Create the single inventory of `owner`.
    #[instrument(
        skip(self, principal),
        fields(principal = %principal.user_id, owner = %owner),
        err
    )]
    pub fn provision_inventory(
        &self,
        principal: &Principal,
        owner: UserId,
    ) -> ServiceResult<UserInventory> {
        self.load_user(owner)?;
        self.guard(principal, owner, INVENTORY, Access::Write)?;

        let mut inventory =
            UserInventory::provision(UserInventoryId::generate(), owner, Utc::now());
        self.store.provision_inventory(&mut inventory)?;
        info!(inventory = %inventory.id_typed(), "inventory provisioned");
        Ok(inventory)
    }

    #[instrument(
        level = "debug",
        skip(self, principal),
        fields(principal = %principal.user_id, inventory = %id),
        err
    )]
    pub fn get_inventory(
        &self,
        principal: &Principal,
        id: UserInventoryId,
    ) -> ServiceResult<UserInventory> {
        let inventory = self.load_inventory(id)?;
        self.guard(principal, inventory.owner(), INVENTORY, Access::Read)?;
        Ok(inventory)
    }

    /// Inventory of `owner`.
    ///
    /// A missing user is NotFound; a caller other than the owner is Forbidden;
    /// an owner without an inventory is NotFound unless auto-provisioning is on
    /// and the owner asks for their own.
    #[instrument(
        level = "debug",
        skip(self, principal),
        fields(principal = %principal.user_id, owner = %owner),
        err
    )]
    pub fn inventory_for_user(
        &self,
        principal: &Principal,
        owner: UserId,
    ) -> ServiceResult<UserInventory> {
        self.load_user(owner)?;
        self.guard(principal, owner, INVENTORY, Access::Read)?;

        if let Some(inventory) = self.store.inventory_for_owner(owner)? {
            return Ok(inventory);
        }
        if self.settings.auto_provision && principal.user_id == owner {
            let mut inventory =
                UserInventory::provision(UserInventoryId::generate(), owner, Utc::now());
            self.store.provision_inventory(&mut inventory)?;
            info!(inventory = %inventory.id_typed(), "inventory provisioned on first access");
            return Ok(inventory);
        }
        Err(DomainError::not_found(INVENTORY, format!("owner {owner}")).into())
    }

    /// Delete an inventory. Its items survive without membership.
    #[instrument(
        skip(self, principal),
        fields(principal = %principal.user_id, inventory = %id),
        err
    )]
    pub fn delete_inventory(
        &self,
        principal: &Principal,
        id: UserInventoryId,
    ) -> ServiceResult<()> {
        let inventory = self.load_inventory(id)?;
        self.guard(principal, inventory.owner(), INVENTORY, Access::Write)?;

        self.store.delete_inventory(id)?;
        info!("inventory deleted");
        Ok(())
    }

    /// E.g. `alice's Inventory`.
    pub fn inventory_name(
        &self,
        principal: &Principal,
        id: UserInventoryId,
    ) -> ServiceResult<String> {
        let inventory = self.get_inventory(principal, id)?;
        let owner = self.load_user(inventory.owner())?;
        Ok(inventory.display_name(&owner.username))
    }

    /// Items that are members of the inventory, in creation order.
    #[instrument(
        level = "debug",
        skip(self, principal),
        fields(principal = %principal.user_id, inventory = %id),
        err
    )]
    pub fn inventory_items(
        &self,
        principal: &Principal,
        id: UserInventoryId,
    ) -> ServiceResult<Vec<InventoryItem>> {
        let inventory = self.get_inventory(principal, id)?;
        let items = self
            .store
            .list_items(ItemFilter::in_inventory(inventory.id_typed()))?;
        debug!(count = items.len(), "inventory items listed");
        Ok(items)
    }

    /// Create an item owned by the inventory's owner and already a member.
    #[instrument(
        skip(self, principal, card_data),
        fields(principal = %principal.user_id, inventory = %id),
        err
    )]
    pub fn add_card_to_inventory(
        &self,
        principal: &Principal,
        id: UserInventoryId,
        card_data: NewInventoryItem,
    ) -> ServiceResult<InventoryItem> {
        let inventory = self.load_inventory(id)?;
        self.guard(principal, inventory.owner(), INVENTORY, Access::Write)?;
        self.check_card(card_data.card)?;

        let mut item =
            inventory.add_card_to_inventory(InventoryItemId::generate(), card_data, Utc::now());
        self.store.insert_item(&mut item)?;
        info!(item = %item.id_typed(), "card added to inventory");
        Ok(item)
    }

    #[instrument(
        skip(self, principal, ids),
        fields(principal = %principal.user_id, inventory = %id, count = ids.len()),
        err
    )]
    pub fn add_items_to_inventory(
        &self,
        principal: &Principal,
        id: UserInventoryId,
        ids: &[InventoryItemId],
    ) -> ServiceResult<usize> {
        let inventory = self.load_inventory(id)?;
        self.guard(principal, inventory.owner(), INVENTORY, Access::Write)?;

        let mut failure = None;
        let result = inventory.add_items_to_inventory(
            ids.iter().copied(),
            self.settings.batch_mode,
            self.resolver(&mut failure),
            |mut item| self.save_item(&mut item),
        );
        self.finish_batch(failure, result, "items added to inventory")
    }

    #[instrument(
        skip(self, principal, ids),
        fields(principal = %principal.user_id, inventory = %id, count = ids.len()),
        err
    )]
    pub fn remove_items_from_inventory(
        &self,
        principal: &Principal,
        id: UserInventoryId,
        ids: &[InventoryItemId],
    ) -> ServiceResult<usize> {
        let inventory = self.load_inventory(id)?;
        self.guard(principal, inventory.owner(), INVENTORY, Access::Write)?;

        let mut failure = None;
        let result = inventory.remove_items_from_inventory(
            ids.iter().copied(),
            self.settings.batch_mode,
            self.resolver(&mut failure),
            |mut item| self.save_item(&mut item),
        );
        self.finish_batch(failure, result, "items removed from inventory")
    }

    pub fn cubes(
        &self,
        principal: &Principal,
        id: UserInventoryId,
    ) -> ServiceResult<Vec<SubCollection>> {
        let (inventory, all) = self.inventory_view(principal, id)?;
        Ok(inventory.cubes(all))
    }

    pub fn decks(
        &self,
        principal: &Principal,
        id: UserInventoryId,
    ) -> ServiceResult<Vec<SubCollection>> {
        let (inventory, all) = self.inventory_view(principal, id)?;
        Ok(inventory.decks(all))
    }

    pub fn collections(
        &self,
        principal: &Principal,
        id: UserInventoryId,
    ) -> ServiceResult<Vec<SubCollection>> {
        let (inventory, all) = self.inventory_view(principal, id)?;
        Ok(inventory.collections(all))
    }

    pub fn tradelists(
        &self,
        principal: &Principal,
        id: UserInventoryId,
    ) -> ServiceResult<Vec<SubCollection>> {
        let (inventory, all) = self.inventory_view(principal, id)?;
        Ok(inventory.tradelists(all))
    }

    pub fn other_subcollections(
        &self,
        principal: &Principal,
        id: UserInventoryId,
    ) -> ServiceResult<Vec<SubCollection>> {
        let (inventory, all) = self.inventory_view(principal, id)?;
        Ok(inventory.other_subcollections(all))
    }

    // ---- items ---------------------------------------------------------

    /// Create an item owned by the caller, outside any inventory.
    #[instrument(skip(self, principal, new), fields(principal = %principal.user_id), err)]
    pub fn create_item(
        &self,
        principal: &Principal,
        new: NewInventoryItem,
    ) -> ServiceResult<InventoryItem> {
        let owner = self.load_user(principal.user_id)?;
        self.check_card(new.card)?;

        let mut item =
            InventoryItem::create(InventoryItemId::generate(), owner.id, new, Utc::now());
        self.store.insert_item(&mut item)?;
        info!(item = %item.id_typed(), "inventory item created");
        Ok(item)
    }

    #[instrument(
        level = "debug",
        skip(self, principal),
        fields(principal = %principal.user_id, item = %id),
        err
    )]
    pub fn get_item(
        &self,
        principal: &Principal,
        id: InventoryItemId,
    ) -> ServiceResult<InventoryItem> {
        let item = self.load_item(id)?;
        self.guard(principal, item.owner(), ITEM, Access::Read)?;
        Ok(item)
    }

    #[instrument(
        skip(self, principal, changes),
        fields(principal = %principal.user_id, item = %id),
        err
    )]
    pub fn update_item(
        &self,
        principal: &Principal,
        id: InventoryItemId,
        changes: &ItemChanges,
    ) -> ServiceResult<InventoryItem> {
        let mut item = self.load_item(id)?;
        self.guard(principal, item.owner(), ITEM, Access::Write)?;
        if let Some(card) = changes.card {
            self.check_card(card)?;
        }

        item.apply_changes(changes);
        self.save_item(&mut item)?;
        info!(version = item.version(), "inventory item updated");
        Ok(item)
    }

    /// Delete an item, its grading details and its sub-collection memberships.
    #[instrument(skip(self, principal), fields(principal = %principal.user_id, item = %id), err)]
    pub fn delete_item(&self, principal: &Principal, id: InventoryItemId) -> ServiceResult<()> {
        let item = self.load_item(id)?;
        self.guard(principal, item.owner(), ITEM, Access::Write)?;

        self.store.delete_item(id)?;
        info!("inventory item deleted");
        Ok(())
    }

    /// Every item owned by `owner`, in creation order.
    #[instrument(
        level = "debug",
        skip(self, principal),
        fields(principal = %principal.user_id, owner = %owner),
        err
    )]
    pub fn list_items(
        &self,
        principal: &Principal,
        owner: UserId,
    ) -> ServiceResult<Vec<InventoryItem>> {
        self.load_user(owner)?;
        self.guard(principal, owner, ITEM, Access::Read)?;
        Ok(self.store.list_items(ItemFilter::owned_by(owner))?)
    }

    /// Create grading details and link them to the item, replacing any
    /// previous details. Both writes land together or not at all.
    #[instrument(
        skip(self, principal, payload),
        fields(principal = %principal.user_id, item = %id),
        err
    )]
    pub fn attach_grading_details(
        &self,
        principal: &Principal,
        id: InventoryItemId,
        payload: GradingPayload,
    ) -> ServiceResult<GradingDetails> {
        let mut item = self.load_item(id)?;
        self.guard(principal, item.owner(), ITEM, Access::Write)?;

        let details =
            GradingDetails::from_payload(GradingDetailsId::generate(), payload, Utc::now());
        let expected = item.expected_version();
        let replaced = item.attach_grading(&details);
        self.store
            .attach_grading(&mut item, details.clone(), replaced, expected)?;
        info!(
            grading_details = %details.id,
            replaced = replaced.is_some(),
            "grading details attached"
        );
        Ok(details)
    }

    #[instrument(
        level = "debug",
        skip(self, principal),
        fields(principal = %principal.user_id, item = %id),
        err
    )]
    pub fn get_grading_details(
        &self,
        principal: &Principal,
        id: InventoryItemId,
    ) -> ServiceResult<Option<GradingDetails>> {
        let item = self.get_item(principal, id)?;
        match item.grading_details() {
            Some(details) => Ok(self.store.get_grading_details(details)?),
            None => Ok(None),
        }
    }

    /// Display label, e.g. `NM Arid Mesa Foil` or `9.5 B Arid Mesa Signed`.
    pub fn item_label(&self, principal: &Principal, id: InventoryItemId) -> ServiceResult<String> {
        let item = self.get_item(principal, id)?;
        let card_name = item.card().and_then(|card| self.catalog.card_name(card));
        let grading = match item.grading_details() {
            Some(details) => self.store.get_grading_details(details)?,
            None => None,
        };
        Ok(item.label(card_name.as_deref(), grading.as_ref()))
    }

    // ---- sub-collections -----------------------------------------------

    #[instrument(
        skip(self, principal, new),
        fields(principal = %principal.user_id, kind = %new.kind),
        err
    )]
    pub fn create_subcollection(
        &self,
        principal: &Principal,
        new: NewSubCollection,
    ) -> ServiceResult<SubCollection> {
        let owner = self.load_user(principal.user_id)?;

        let mut subcollection =
            SubCollection::create(SubCollectionId::generate(), owner.id, new, Utc::now());
        self.store.insert_subcollection(&mut subcollection)?;
        info!(subcollection = %subcollection.id_typed(), "sub-collection created");
        Ok(subcollection)
    }

    #[instrument(
        level = "debug",
        skip(self, principal),
        fields(principal = %principal.user_id, subcollection = %id),
        err
    )]
    pub fn get_subcollection(
        &self,
        principal: &Principal,
        id: SubCollectionId,
    ) -> ServiceResult<SubCollection> {
        let subcollection = self.load_subcollection(id)?;
        self.guard(principal, subcollection.owner(), SUBCOLLECTION, Access::Read)?;
        Ok(subcollection)
    }

    #[instrument(
        skip(self, principal, changes),
        fields(principal = %principal.user_id, subcollection = %id),
        err
    )]
    pub fn update_subcollection(
        &self,
        principal: &Principal,
        id: SubCollectionId,
        changes: SubCollectionChanges,
    ) -> ServiceResult<SubCollection> {
        let mut subcollection = self.load_subcollection(id)?;
        self.guard(principal, subcollection.owner(), SUBCOLLECTION, Access::Write)?;

        subcollection.apply_changes(changes);
        let expected = subcollection.expected_version();
        self.store.update_subcollection(&mut subcollection, expected)?;
        info!(version = subcollection.version(), "sub-collection updated");
        Ok(subcollection)
    }

    /// Delete a sub-collection. Member items are untouched.
    #[instrument(
        skip(self, principal),
        fields(principal = %principal.user_id, subcollection = %id),
        err
    )]
    pub fn delete_subcollection(
        &self,
        principal: &Principal,
        id: SubCollectionId,
    ) -> ServiceResult<()> {
        let subcollection = self.load_subcollection(id)?;
        self.guard(principal, subcollection.owner(), SUBCOLLECTION, Access::Write)?;

        self.store.delete_subcollection(id)?;
        info!("sub-collection deleted");
        Ok(())
    }

    /// Sub-collections of `owner`, optionally of one kind, in creation order.
    #[instrument(
        level = "debug",
        skip(self, principal),
        fields(principal = %principal.user_id, owner = %owner),
        err
    )]
    pub fn list_subcollections(
        &self,
        principal: &Principal,
        owner: UserId,
        kind: Option<SubCollectionKind>,
    ) -> ServiceResult<Vec<SubCollection>> {
        self.load_user(owner)?;
        self.guard(principal, owner, SUBCOLLECTION, Access::Read)?;
        Ok(self.store.list_subcollections(owner, kind)?)
    }

    /// E.g. `alice's cube`.
    pub fn subcollection_name(
        &self,
        principal: &Principal,
        id: SubCollectionId,
    ) -> ServiceResult<String> {
        let subcollection = self.get_subcollection(principal, id)?;
        let owner = self.load_user(subcollection.owner())?;
        Ok(subcollection.display_name(&owner.username))
    }

    /// Add items to a sub-collection.
    ///
    /// In fail-fast mode, items added before an unresolved id are saved even
    /// though the call fails.
    #[instrument(
        skip(self, principal, ids),
        fields(principal = %principal.user_id, subcollection = %id, count = ids.len()),
        err
    )]
    pub fn add_items_to_subcollection(
        &self,
        principal: &Principal,
        id: SubCollectionId,
        ids: &[InventoryItemId],
    ) -> ServiceResult<usize> {
        let mut subcollection = self.load_subcollection(id)?;
        self.guard(principal, subcollection.owner(), SUBCOLLECTION, Access::Write)?;

        let before = subcollection.items().clone();
        let mut failure = None;
        let result = subcollection
            .add_items(
                ids.iter().copied(),
                self.settings.batch_mode,
                self.resolver(&mut failure),
            )
            .map_err(ServiceError::from);
        if subcollection.items() != &before {
            self.save_subcollection(&mut subcollection)?;
        }
        self.finish_batch(failure, result, "items added to sub-collection")
    }

    /// Remove items from a sub-collection; same failure semantics as adding.
    #[instrument(
        skip(self, principal, ids),
        fields(principal = %principal.user_id, subcollection = %id, count = ids.len()),
        err
    )]
    pub fn remove_items_from_subcollection(
        &self,
        principal: &Principal,
        id: SubCollectionId,
        ids: &[InventoryItemId],
    ) -> ServiceResult<usize> {
        let mut subcollection = self.load_subcollection(id)?;
        self.guard(principal, subcollection.owner(), SUBCOLLECTION, Access::Write)?;

        let before = subcollection.items().clone();
        let mut failure = None;
        let result = subcollection
            .remove_items(
                ids.iter().copied(),
                self.settings.batch_mode,
                self.resolver(&mut failure),
            )
            .map_err(ServiceError::from);
        if subcollection.items() != &before {
            self.save_subcollection(&mut subcollection)?;
        }
        self.finish_batch(failure, result, "items removed from sub-collection")
    }

    // ---- catalog -------------------------------------------------------

    /// A catalog entry went away: unlink every item that referenced it.
    #[instrument(skip(self), fields(card = %card), err)]
    pub fn card_removed(&self, card: CardId) -> ServiceResult<usize> {
        let cleared = self.store.clear_card(card)?;
        info!(cleared, "card links cleared");
        Ok(cleared)
    }

    // ---- helpers -------------------------------------------------------

    fn guard(
        &self,
        principal: &Principal,
        owner: UserId,
        resource: &'static str,
        access: Access,
    ) -> ServiceResult<()> {
        self.authz
            .check(principal, owner, resource, access)
            .map_err(|err| ServiceError::Domain(err.into()))
    }

    fn check_card(&self, card: Option<CardId>) -> DomainResult<()> {
        match card {
            Some(card) if !self.catalog.contains(card) => Err(DomainError::not_found("card", card)),
            _ => Ok(()),
        }
    }

    fn load_user(&self, id: UserId) -> ServiceResult<User> {
        self.store
            .get_user(id)?
            .ok_or_else(|| DomainError::not_found(USER, id).into())
    }

    fn load_inventory(&self, id: UserInventoryId) -> ServiceResult<UserInventory> {
        self.store
            .get_inventory(id)?
            .ok_or_else(|| DomainError::not_found(INVENTORY, id).into())
    }

    fn load_item(&self, id: InventoryItemId) -> ServiceResult<InventoryItem> {
        self.store
            .get_item(id)?
            .ok_or_else(|| DomainError::not_found(ITEM, id).into())
    }

    fn load_subcollection(&self, id: SubCollectionId) -> ServiceResult<SubCollection> {
        self.store
            .get_subcollection(id)?
            .ok_or_else(|| DomainError::not_found(SUBCOLLECTION, id).into())
    }

    fn inventory_view(
        &self,
        principal: &Principal,
        id: UserInventoryId,
    ) -> ServiceResult<(UserInventory, Vec<SubCollection>)> {
        let inventory = self.get_inventory(principal, id)?;
        let all = self.store.list_subcollections(inventory.owner(), None)?;
        Ok((inventory, all))
    }

    fn save_item(&self, item: &mut InventoryItem) -> ServiceResult<()> {
        let expected = item.expected_version();
        Ok(self.store.update_item(item, expected)?)
    }

    fn save_subcollection(&self, subcollection: &mut SubCollection) -> ServiceResult<()> {
        let expected = subcollection.expected_version();
        Ok(self.store.update_subcollection(subcollection, expected)?)
    }

    /// Batch item lookup. Store failures are parked in `failure` so they
    /// surface as store errors rather than as an invalid item.
    fn resolver<'a>(
        &'a self,
        failure: &'a mut Option<StoreError>,
    ) -> impl FnMut(InventoryItemId) -> DomainResult<InventoryItem> + 'a {
        move |id| match self.store.get_item(id) {
            Ok(Some(item)) => Ok(item),
            Ok(None) => Err(DomainError::not_found(ITEM, id)),
            Err(err) => {
                let message = err.to_string();
                *failure = Some(err);
                Err(DomainError::invariant(message))
            }
        }
    }

    fn finish_batch(
        &self,
        failure: Option<StoreError>,
        result: ServiceResult<usize>,
        done: &'static str,
    ) -> ServiceResult<usize> {
        if let Some(err) = failure {
            return Err(ServiceError::Store(err));
        }
        match result {
            Ok(changed) => {
                info!(changed, mode = ?self.settings.batch_mode, "{done}");
                Ok(changed)
            }
            Err(err) => {
                let offending = err.as_domain().and_then(DomainError::offending_item);
                warn!(
                    offending,
                    mode = ?self.settings.batch_mode,
                    error = %err,
                    "batch stopped early"
                );
                Err(err)
            }
        }
    }
}
