//! # Marketplace Facade
//!
//! Owns every store plus the shared backend and event bus, and implements
//! the flows that touch more than one store.
//!
//! ## Cross-Store Flows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  request_rental ──► listings.get ──► rentals.create ──► messages.send  │
//! │                                          │                  │           │
//! │                                          │     (failure only logged)   │
//! │                                          ▼                              │
//! │                                   RentalSubmission                      │
//! │                                                                         │
//! │  browse ──► listings.list_all_fresh(users) ──► search(reviews)         │
//! │                                                                         │
//! │  rental_for_message ──► message.reference ──► rentals.get              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these flows is atomic. Each store commits on its own; a later
//! step failing does not undo an earlier one.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use rigshare_core::rental::request_notice_text;
use rigshare_core::{
    CoreError, DisplayNames, Equipment, Message, MessageReference, NewEquipment, RentalRequest,
    RentalSubject,
};

use crate::backend::StateBackend;
use crate::config::StateConfig;
use crate::error::StateResult;
use crate::events::EventBus;
use crate::favorites::FavoritesStore;
use crate::listings::ListingStore;
use crate::messages::MessageStore;
use crate::rentals::RentalStore;
use crate::reviews::ReviewStore;
use crate::search::SearchSession;
use crate::users::UserDirectory;

/// Outcome of [`Marketplace::request_rental`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalSubmission {
    pub request: RentalRequest,
    /// The owner notification, `None` if it could not be delivered.
    pub notice: Option<Message>,
}

pub struct Marketplace {
    events: EventBus,
    listings: ListingStore,
    rentals: RentalStore,
    messages: MessageStore,
    reviews: ReviewStore,
    favorites: FavoritesStore,
    users: UserDirectory,
    search: SearchSession,
}

impl Marketplace {
    /// Opens every store on the backend described by `config`.
    pub fn open(config: &StateConfig) -> StateResult<Self> {
        let backend = config.open_backend()?;
        Self::with_backend(backend, EventBus::new(config.event_capacity))
    }

    pub fn with_backend(backend: Arc<dyn StateBackend>, events: EventBus) -> StateResult<Self> {
        let marketplace = Marketplace {
            listings: ListingStore::open(backend.clone(), events.clone())?,
            rentals: RentalStore::open(backend.clone(), events.clone())?,
            messages: MessageStore::open(backend.clone(), events.clone())?,
            reviews: ReviewStore::open(backend.clone(), events.clone())?,
            favorites: FavoritesStore::open(backend.clone(), events.clone())?,
            users: UserDirectory::open(backend, events.clone())?,
            search: SearchSession::new(),
            events,
        };
        info!(
            listings = marketplace.listings.len(),
            rentals = marketplace.rentals.list_all().len(),
            users = marketplace.users.list().len(),
            "Marketplace opened"
        );
        Ok(marketplace)
    }

    // =========================================================================
    // Store Access
    // =========================================================================

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn listings(&self) -> &ListingStore {
        &self.listings
    }

    pub fn listings_mut(&mut self) -> &mut ListingStore {
        &mut self.listings
    }

    pub fn rentals(&self) -> &RentalStore {
        &self.rentals
    }

    pub fn rentals_mut(&mut self) -> &mut RentalStore {
        &mut self.rentals
    }

    pub fn messages(&self) -> &MessageStore {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut MessageStore {
        &mut self.messages
    }

    pub fn reviews(&self) -> &ReviewStore {
        &self.reviews
    }

    pub fn reviews_mut(&mut self) -> &mut ReviewStore {
        &mut self.reviews
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    pub fn favorites_mut(&mut self) -> &mut FavoritesStore {
        &mut self.favorites
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    pub fn users_mut(&mut self) -> &mut UserDirectory {
        &mut self.users
    }

    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    pub fn search_mut(&mut self) -> &mut SearchSession {
        &mut self.search
    }

    // =========================================================================
    // Cross-Store Flows
    // =========================================================================

    /// Creates a listing owned by a known user, caching their current name.
    pub fn create_listing(&mut self, listing: NewEquipment, owner_id: &str) -> StateResult<Equipment> {
        if owner_id.trim().is_empty() {
            return Err(CoreError::Unauthenticated.into());
        }
        let owner_name = self
            .users
            .display_name(owner_id)
            .ok_or_else(|| CoreError::not_found("User", owner_id))?;
        self.listings.create(listing, owner_id, &owner_name)
    }

    /// Requests a rental and notifies the owner.
    ///
    /// The notification carries a structured reference to the request. If it
    /// cannot be sent the request still stands and `notice` is `None`.
    pub fn request_rental(
        &mut self,
        equipment_id: &str,
        renter_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        notes: Option<String>,
    ) -> StateResult<RentalSubmission> {
        if renter_id.trim().is_empty() {
            return Err(CoreError::Unauthenticated.into());
        }
        let equipment = self
            .listings
            .get(equipment_id)
            .ok_or_else(|| CoreError::not_found("Equipment", equipment_id))?;
        let mut subject = RentalSubject::from(equipment);
        if let Some(name) = self.users.display_name(&subject.owner_id) {
            subject.owner_name = name;
        }
        let renter_name = self
            .users
            .display_name(renter_id)
            .ok_or_else(|| CoreError::not_found("User", renter_id))?;

        let request = self.rentals.create(
            &subject,
            renter_id,
            &renter_name,
            start_date,
            end_date,
            notes,
        )?;

        let notice = match self.messages.send_with_reference(
            renter_id,
            &renter_name,
            &request.owner_id,
            &request.owner_name,
            &request_notice_text(&request),
            MessageReference::RentalRequest {
                id: request.id.clone(),
            },
        ) {
            Ok(message) => Some(message),
            Err(err) => {
                warn!(request_id = %request.id, error = %err, "Rental notification not delivered");
                None
            }
        };

        info!(
            request_id = %request.id,
            equipment_id,
            renter_id,
            "Rental requested"
        );
        Ok(RentalSubmission { request, notice })
    }

    /// The rental request a message links to, if any and if it still exists.
    pub fn rental_for_message(&self, message_id: &str) -> Option<&RentalRequest> {
        let message = self.messages.get(message_id)?;
        let request_id = message.reference.as_ref()?.rental_request_id()?;
        self.rentals.get(request_id)
    }

    /// Search results over the catalog with fresh owner names.
    pub fn browse(&self) -> Vec<Equipment> {
        let catalog = self.listings.list_all_fresh(&self.users);
        self.search.results(&catalog, &self.reviews.ratings())
    }

    /// Favorited listings that still exist, in favorite order.
    pub fn favorite_listings(&self) -> Vec<Equipment> {
        self.favorites
            .list()
            .iter()
            .filter_map(|id| self.listings.get(id))
            .cloned()
            .collect()
    }

    /// Deletes a listing. Reviews and rentals for it are kept; lookups by
    /// its id simply return nothing listing-side.
    pub fn delete_listing(&mut self, equipment_id: &str, requester_id: &str) -> StateResult<Equipment> {
        self.listings.delete(equipment_id, requester_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
