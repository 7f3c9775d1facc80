//! # Listings Store
//!
//! The equipment catalog: one global list, persisted per owner.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  backend                          memory                               │
//! │  ─────────────────────            ───────────────────────────          │
//! │  listings:u-1  [e1, e4]  ──┐                                           │
//! │  listings:u-2  [e2]      ──┼──►  catalog [e1, e2, e3, e4]              │
//! │  listings:u-3  [e3]      ──┘      (ordered by createdAt)               │
//! │                                                                         │
//! │  A mutation rewrites only the touched owner's partition.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Mutation Order
//! Clone the catalog, apply the change to the clone, save the affected
//! partition, then swap the clone in. A failed save leaves memory as it was.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use rigshare_core::validation::{validate_equipment_patch, validate_image_uri, validate_new_equipment};
use rigshare_core::{
    generate_id, CoreError, DisplayNames, Equipment, EquipmentPatch, NewEquipment,
};

use crate::backend::{listings_key, load_collection, save_collection, StateBackend, LISTINGS_PREFIX};
use crate::error::StateResult;
use crate::events::{EventBus, StoreEvent};
use crate::sequencer::{LatestOnly, RequestToken};

/// Message shown when a remote catalog load fails. Details go to the log.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load listings";

/// Remote catalog load status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Entity store for listings.
pub struct ListingStore {
    backend: Arc<dyn StateBackend>,
    events: EventBus,
    items: Vec<Equipment>,
    load_state: LoadState,
    fetches: LatestOnly,
}

impl ListingStore {
    /// Rebuilds the catalog from every owner partition.
    pub fn open(backend: Arc<dyn StateBackend>, events: EventBus) -> StateResult<Self> {
        let mut items = Vec::new();
        for key in backend.keys_with_prefix(LISTINGS_PREFIX)? {
            let partition: Vec<Equipment> = load_collection(backend.as_ref(), &key)?;
            items.extend(partition);
        }
        sort_catalog(&mut items);
        debug!(count = items.len(), "Listings loaded");

        Ok(ListingStore {
            backend,
            events,
            items,
            load_state: LoadState::Idle,
            fetches: LatestOnly::new(),
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn get(&self, id: &str) -> Option<&Equipment> {
        self.items.iter().find(|e| e.id == id)
    }

    /// The whole catalog, oldest first.
    pub fn list_all(&self) -> &[Equipment] {
        &self.items
    }

    pub fn list_by_owner(&self, owner_id: &str) -> Vec<&Equipment> {
        self.items.iter().filter(|e| e.owner_id == owner_id).collect()
    }

    /// The catalog with `owner_name` refreshed from `names`.
    ///
    /// Owners unknown to `names` keep their cached name.
    pub fn list_all_fresh<N: DisplayNames + ?Sized>(&self, names: &N) -> Vec<Equipment> {
        self.items
            .iter()
            .map(|item| {
                let mut item = item.clone();
                if let Some(name) = names.display_name(&item.owner_id) {
                    item.owner_name = name;
                }
                item
            })
            .collect()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Creates a listing owned by `owner_id`.
    ///
    /// ## Errors
    /// - `Unauthenticated` when `owner_id` is blank
    /// - `Validation` for bad fields
    pub fn create(
        &mut self,
        listing: NewEquipment,
        owner_id: &str,
        owner_name: &str,
    ) -> StateResult<Equipment> {
        if owner_id.trim().is_empty() {
            return Err(CoreError::Unauthenticated.into());
        }
        validate_new_equipment(&listing)?;
        let listing = listing.trimmed();

        let now = Utc::now();
        let equipment = Equipment {
            id: generate_id(),
            name: listing.name,
            description: listing.description,
            price_cents: listing.price_cents,
            category: listing.category,
            location: listing.location,
            image: listing.image,
            owner_id: owner_id.to_string(),
            owner_name: owner_name.to_string(),
            delivery_options: listing.delivery_options,
            created_at: now,
            updated_at: now,
        };

        let mut next = self.items.clone();
        next.push(equipment.clone());
        self.persist_owner(&next, owner_id)?;
        self.items = next;

        debug!(id = %equipment.id, owner_id, "Listing created");
        self.events.publish(StoreEvent::ListingCreated {
            id: equipment.id.clone(),
        });
        Ok(equipment)
    }

    /// Applies `patch` to a listing owned by `requester_id`.
    pub fn update(
        &mut self,
        id: &str,
        patch: EquipmentPatch,
        requester_id: &str,
    ) -> StateResult<Equipment> {
        let index = self.owned_index(id, requester_id)?;
        validate_equipment_patch(&patch)?;

        let mut next = self.items.clone();
        let item = &mut next[index];
        patch.apply_to(item);
        item.updated_at = Utc::now();
        let updated = item.clone();

        self.persist_owner(&next, &updated.owner_id)?;
        self.items = next;

        debug!(id, "Listing updated");
        self.events.publish(StoreEvent::ListingUpdated { id: id.to_string() });
        Ok(updated)
    }

    /// Replaces the image of a listing owned by `requester_id`.
    pub fn set_image(&mut self, id: &str, uri: &str, requester_id: &str) -> StateResult<Equipment> {
        self.owned_index(id, requester_id)?;
        validate_image_uri(uri)?;
        let patch = EquipmentPatch {
            image: Some(uri.to_string()),
            ..Default::default()
        };
        self.update(id, patch, requester_id)
    }

    /// Deletes a listing owned by `requester_id` and returns it.
    ///
    /// Reviews, rentals and favorites that mention the id are left alone.
    pub fn delete(&mut self, id: &str, requester_id: &str) -> StateResult<Equipment> {
        let index = self.owned_index(id, requester_id)?;

        let mut next = self.items.clone();
        let removed = next.remove(index);
        self.persist_owner(&next, &removed.owner_id)?;
        self.items = next;

        debug!(id, "Listing deleted");
        self.events.publish(StoreEvent::ListingDeleted { id: id.to_string() });
        Ok(removed)
    }

    // =========================================================================
    // Remote Loads
    // =========================================================================

    /// Starts a remote catalog load.
    pub fn begin_fetch(&mut self) -> RequestToken {
        self.load_state = LoadState::Loading;
        self.fetches.issue()
    }

    /// Replaces the catalog with a remote response.
    ///
    /// Returns `false` without touching anything when a newer fetch has
    /// been started since `token` was issued.
    ///
    /// If any partition fails to save, the partitions already written are
    /// restored from the current catalog, the load is marked failed and the
    /// error is returned. Memory keeps the current catalog.
    pub fn apply_fetch(&mut self, token: RequestToken, mut items: Vec<Equipment>) -> StateResult<bool> {
        if !self.fetches.is_current(token) {
            debug!(token = token.value(), "Dropping stale catalog response");
            return Ok(false);
        }
        sort_catalog(&mut items);

        let owners: BTreeSet<String> = self
            .items
            .iter()
            .chain(items.iter())
            .map(|e| e.owner_id.clone())
            .collect();
        let mut written: Vec<&String> = Vec::with_capacity(owners.len());
        for owner in &owners {
            if let Err(err) = self.persist_owner(&items, owner) {
                for done in written {
                    if let Err(restore) = self.persist_owner(&self.items, done) {
                        warn!(owner_id = %done, error = %restore, "Could not restore listings partition");
                    }
                }
                warn!(owner_id = %owner, error = %err, "Catalog load failed while saving");
                self.load_state = LoadState::Failed(LOAD_FAILED_MESSAGE.to_string());
                self.events.publish(StoreEvent::CatalogLoadFailed);
                return Err(err);
            }
            written.push(owner);
        }

        let count = items.len();
        self.items = items;
        self.load_state = LoadState::Ready;
        debug!(count, "Catalog replaced from remote");
        self.events.publish(StoreEvent::CatalogLoaded { count });
        Ok(true)
    }

    /// Records a failed remote load. Stale failures are ignored.
    pub fn fail_fetch(&mut self, token: RequestToken, detail: &str) -> bool {
        if !self.fetches.is_current(token) {
            return false;
        }
        warn!(detail, "Catalog load failed");
        self.load_state = LoadState::Failed(LOAD_FAILED_MESSAGE.to_string());
        self.events.publish(StoreEvent::CatalogLoadFailed);
        true
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn owned_index(&self, id: &str, requester_id: &str) -> StateResult<usize> {
        if requester_id.trim().is_empty() {
            return Err(CoreError::Unauthenticated.into());
        }
        let index = self
            .items
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CoreError::not_found("Equipment", id))?;
        if !self.items[index].is_owned_by(requester_id) {
            return Err(CoreError::unauthorized("Equipment", id, requester_id).into());
        }
        Ok(index)
    }

    /// Writes `owner_id`'s slice of `catalog`, dropping the key when empty.
    fn persist_owner(&self, catalog: &[Equipment], owner_id: &str) -> StateResult<()> {
        let partition: Vec<&Equipment> = catalog.iter().filter(|e| e.owner_id == owner_id).collect();
        let key = listings_key(owner_id);
        if partition.is_empty() {
            self.backend.remove(&key)
        } else {
            save_collection(self.backend.as_ref(), &key, &partition)
        }
    }
}

fn sort_catalog(items: &mut [Equipment]) {
    items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::error::StateError;
    use crate::testing::FailingBackend;
    use chrono::{Duration, TimeZone};
    use rigshare_core::DeliveryOptions;
    use std::collections::HashMap;

    fn store() -> (ListingStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let store = ListingStore::open(backend.clone(), EventBus::default()).unwrap();
        (store, backend)
    }

    fn camera() -> NewEquipment {
        NewEquipment {
            name: "Sony A7III".to_string(),
            description: "Full frame mirrorless".to_string(),
            price_cents: 7500,
            category: "Cameras".to_string(),
            location: "Los Angeles, CA".to_string(),
            image: None,
            delivery_options: DeliveryOptions {
                pickup: true,
                ..Default::default()
            },
        }
    }

    fn core_err(err: StateError) -> CoreError {
        match err {
            StateError::Core(e) => e,
            other => panic!("expected core error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_assigns_id_and_persists_partition() {
        let (mut store, backend) = store();
        let item = store.create(camera(), "u-1", "John Doe").unwrap();

        assert!(!item.id.is_empty());
        assert_eq!(item.owner_name, "John Doe");
        assert_eq!(store.get(&item.id), Some(&item));

        let persisted: Vec<Equipment> = load_collection(backend.as_ref(), "listings:u-1").unwrap();
        assert_eq!(persisted, vec![item]);
    }

    #[test]
    fn test_create_requires_owner() {
        let (mut store, _) = store();
        let err = store.create(camera(), "", "Nobody").unwrap_err();
        assert_eq!(core_err(err), CoreError::Unauthenticated);
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_validates_fields() {
        let (mut store, _) = store();
        let mut bad = camera();
        bad.price_cents = 0;
        let err = store.create(bad, "u-1", "John Doe").unwrap_err();
        assert!(matches!(core_err(err), CoreError::Validation(_)));
    }

    #[test]
    fn test_update_by_owner() {
        let (mut store, _) = store();
        let item = store.create(camera(), "u-1", "John Doe").unwrap();

        let patch = EquipmentPatch {
            price_cents: Some(8000),
            ..Default::default()
        };
        let updated = store.update(&item.id, patch, "u-1").unwrap();
        assert_eq!(updated.price_cents, 8000);
        assert!(updated.updated_at >= item.updated_at);
        assert_eq!(store.get(&item.id).unwrap().price_cents, 8000);
    }

    #[test]
    fn test_update_rejects_non_owner_and_unknown() {
        let (mut store, _) = store();
        let item = store.create(camera(), "u-1", "John Doe").unwrap();

        let err = store.update(&item.id, EquipmentPatch::default(), "u-2").unwrap_err();
        assert!(matches!(core_err(err), CoreError::Unauthorized { .. }));

        let err = store.update("missing", EquipmentPatch::default(), "u-1").unwrap_err();
        assert!(matches!(core_err(err), CoreError::NotFound { .. }));

        let err = store.update(&item.id, EquipmentPatch::default(), " ").unwrap_err();
        assert_eq!(core_err(err), CoreError::Unauthenticated);
    }

    #[test]
    fn test_delete_removes_partition_when_empty() {
        let (mut store, backend) = store();
        let item = store.create(camera(), "u-1", "John Doe").unwrap();

        let err = store.delete(&item.id, "u-2").unwrap_err();
        assert!(matches!(core_err(err), CoreError::Unauthorized { .. }));

        store.delete(&item.id, "u-1").unwrap();
        assert!(store.get(&item.id).is_none());
        assert_eq!(backend.load("listings:u-1").unwrap(), None);
    }

    #[test]
    fn test_set_image() {
        let (mut store, _) = store();
        let item = store.create(camera(), "u-1", "John Doe").unwrap();
        let updated = store.set_image(&item.id, "/uploads/a7iii.jpg", "u-1").unwrap();
        assert_eq!(updated.image.as_deref(), Some("/uploads/a7iii.jpg"));

        assert!(store.set_image(&item.id, "not a uri", "u-1").is_err());
    }

    #[test]
    fn test_list_by_owner() {
        let (mut store, _) = store();
        store.create(camera(), "u-1", "John Doe").unwrap();
        store.create(camera(), "u-2", "Jane Smith").unwrap();
        store.create(camera(), "u-1", "John Doe").unwrap();

        assert_eq!(store.list_all().len(), 3);
        assert_eq!(store.list_by_owner("u-1").len(), 2);
        assert!(store.list_by_owner("u-3").is_empty());
    }

    #[test]
    fn test_reopen_rebuilds_catalog_in_creation_order() {
        let backend: Arc<dyn StateBackend> = Arc::new(MemoryBackend::new());
        let mut store = ListingStore::open(backend.clone(), EventBus::default()).unwrap();

        let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let make = |id: &str, owner: &str, minutes: i64| Equipment {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            price_cents: 1000,
            category: "Cameras".to_string(),
            location: "LA".to_string(),
            image: None,
            owner_id: owner.to_string(),
            owner_name: owner.to_string(),
            delivery_options: DeliveryOptions::default(),
            created_at: base + Duration::minutes(minutes),
            updated_at: base + Duration::minutes(minutes),
        };
        let token = store.begin_fetch();
        store
            .apply_fetch(token, vec![make("c", "u-2", 3), make("a", "u-1", 1), make("b", "u-2", 2)])
            .unwrap();

        let reopened = ListingStore::open(backend, EventBus::default()).unwrap();
        let ids: Vec<&str> = reopened.list_all().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_list_all_fresh_refreshes_owner_name() {
        let (mut store, _) = store();
        let item = store.create(camera(), "u-1", "John Doe").unwrap();

        let mut names = HashMap::new();
        names.insert("u-1".to_string(), "Johnny Doe".to_string());
        let fresh = store.list_all_fresh(&names);
        assert_eq!(fresh[0].owner_name, "Johnny Doe");
        // The cache itself is untouched.
        assert_eq!(store.get(&item.id).unwrap().owner_name, "John Doe");
    }

    #[test]
    fn test_stale_fetch_dropped() {
        let (mut store, _) = store();
        let first = store.begin_fetch();
        let second = store.begin_fetch();
        assert_eq!(store.load_state(), &LoadState::Loading);

        assert!(store.apply_fetch(second, Vec::new()).unwrap());
        assert_eq!(store.load_state(), &LoadState::Ready);

        let late = store.create(camera(), "u-1", "John Doe").unwrap();
        assert!(!store.apply_fetch(first, Vec::new()).unwrap());
        assert_eq!(store.list_all(), &[late]);
        assert!(!store.fail_fetch(first, "timeout"));
        assert_eq!(store.load_state(), &LoadState::Ready);
    }

    #[test]
    fn test_fail_fetch_sets_generic_message() {
        let (mut store, _) = store();
        let token = store.begin_fetch();
        assert!(store.fail_fetch(token, "connection refused"));
        assert_eq!(
            store.load_state(),
            &LoadState::Failed(LOAD_FAILED_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_failed_save_leaves_memory_unchanged() {
        let backend = Arc::new(FailingBackend::default());
        let mut store = ListingStore::open(backend.clone(), EventBus::default()).unwrap();
        let item = store.create(camera(), "u-1", "John Doe").unwrap();

        backend.fail_writes(true);
        assert!(store.create(camera(), "u-1", "John Doe").is_err());
        assert!(store.delete(&item.id, "u-1").is_err());
        assert_eq!(store.list_all(), &[item]);
    }

    #[test]
    fn test_partial_fetch_save_rolls_back() {
        let backend = Arc::new(FailingBackend::default());
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let mut store = ListingStore::open(backend.clone(), bus).unwrap();
        let existing = store.create(camera(), "u-1", "John Doe").unwrap();
        let _ = rx.try_recv();

        let mut remote_a = existing.clone();
        remote_a.id = "a".to_string();
        let mut remote_b = existing.clone();
        remote_b.id = "b".to_string();
        remote_b.owner_id = "u-2".to_string();

        backend.fail_key("listings:u-2");
        let token = store.begin_fetch();
        assert!(store.apply_fetch(token, vec![remote_a, remote_b]).is_err());

        assert_eq!(store.list_all(), &[existing.clone()]);
        assert_eq!(
            store.load_state(),
            &LoadState::Failed(LOAD_FAILED_MESSAGE.to_string())
        );
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::CatalogLoadFailed);

        let reopened = ListingStore::open(backend, EventBus::default()).unwrap();
        assert_eq!(reopened.list_all(), &[existing]);
    }

    #[test]
    fn test_create_and_update_trim_text_fields() {
        let (mut store, _) = store();
        let mut listing = camera();
        listing.name = "  Sony A7III ".to_string();
        listing.category = " Cameras".to_string();
        listing.location = "Los Angeles, CA  ".to_string();

        let item = store.create(listing, "u-1", "John Doe").unwrap();
        assert_eq!(item.name, "Sony A7III");
        assert_eq!(item.category, "Cameras");
        assert_eq!(item.location, "Los Angeles, CA");

        let patch = EquipmentPatch {
            location: Some(" Burbank, CA ".to_string()),
            ..Default::default()
        };
        let updated = store.update(&item.id, patch, "u-1").unwrap();
        assert_eq!(updated.location, "Burbank, CA");
    }

    #[test]
    fn test_mutations_publish_events() {
        let backend = Arc::new(MemoryBackend::new());
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let mut store = ListingStore::open(backend, bus).unwrap();

        let item = store.create(camera(), "u-1", "John Doe").unwrap();
        store.delete(&item.id, "u-1").unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            StoreEvent::ListingCreated { id: item.id.clone() }
        );
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::ListingDeleted { id: item.id });
    }
}
