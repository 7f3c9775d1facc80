//! # Rental Request Store
//!
//! Holds every rental request and drives the status state machine defined
//! in `rigshare_core::rental`.
//!
//! ## Rentals Page Buckets
//! ```text
//! ┌───────────────┬──────────────┬──────────────────────────────┐
//! │ current       │ active       │ history                      │
//! │ pending       │ approved     │ rejected, completed          │
//! └───────────────┴──────────────┴──────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use rigshare_core::rental::{authorize_transition, build_request, RentalDraft};
use rigshare_core::{generate_id, CoreError, RentalRequest, RentalRole, RentalStatus, RentalSubject};

use crate::backend::{load_collection, save_collection, StateBackend, RENTALS_KEY};
use crate::error::StateResult;
use crate::events::{EventBus, StoreEvent};

/// A user's requests split the way the rentals page shows them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalGroups {
    pub current: Vec<RentalRequest>,
    pub active: Vec<RentalRequest>,
    pub history: Vec<RentalRequest>,
}

pub struct RentalStore {
    backend: Arc<dyn StateBackend>,
    events: EventBus,
    requests: Vec<RentalRequest>,
}

impl RentalStore {
    pub fn open(backend: Arc<dyn StateBackend>, events: EventBus) -> StateResult<Self> {
        let requests: Vec<RentalRequest> = load_collection(backend.as_ref(), RENTALS_KEY)?;
        debug!(count = requests.len(), "Rental requests loaded");
        Ok(RentalStore {
            backend,
            events,
            requests,
        })
    }

    pub fn get(&self, id: &str) -> Option<&RentalRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    pub fn list_all(&self) -> &[RentalRequest] {
        &self.requests
    }

    /// Requests where `user_id` plays `role`, in creation order.
    pub fn list_by_user(&self, user_id: &str, role: RentalRole) -> Vec<&RentalRequest> {
        self.requests
            .iter()
            .filter(|r| r.involves(user_id, role))
            .collect()
    }

    pub fn by_equipment(&self, equipment_id: &str) -> Vec<&RentalRequest> {
        self.requests
            .iter()
            .filter(|r| r.equipment_id == equipment_id)
            .collect()
    }

    /// Buckets `user_id`'s requests by lifecycle stage.
    pub fn grouped_for(&self, user_id: &str, role: RentalRole) -> RentalGroups {
        let mut groups = RentalGroups::default();
        for request in self.list_by_user(user_id, role) {
            let bucket = match request.status {
                RentalStatus::Pending => &mut groups.current,
                RentalStatus::Approved => &mut groups.active,
                RentalStatus::Rejected | RentalStatus::Completed => &mut groups.history,
            };
            bucket.push(request.clone());
        }
        groups
    }

    /// Creates a pending request for `subject`.
    ///
    /// ## Errors
    /// - `Unauthenticated` for a blank renter
    /// - `InvalidRange` when `end_date < start_date`
    /// - `SelfRental` when the renter owns the listing
    pub fn create(
        &mut self,
        subject: &RentalSubject,
        renter_id: &str,
        renter_name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        notes: Option<String>,
    ) -> StateResult<RentalRequest> {
        let request = build_request(
            generate_id(),
            subject,
            RentalDraft {
                renter_id,
                renter_name,
                start_date,
                end_date,
                notes,
            },
            Utc::now(),
        )?;

        let mut next = self.requests.clone();
        next.push(request.clone());
        save_collection(self.backend.as_ref(), RENTALS_KEY, &next)?;
        self.requests = next;

        debug!(
            id = %request.id,
            equipment_id = %request.equipment_id,
            renter_id,
            total_cents = request.total_price_cents,
            "Rental request created"
        );
        self.events.publish(StoreEvent::RentalCreated {
            id: request.id.clone(),
        });
        Ok(request)
    }

    /// Moves a request to `status` on behalf of `requester_id`.
    pub fn set_status(
        &mut self,
        id: &str,
        status: RentalStatus,
        requester_id: &str,
    ) -> StateResult<RentalRequest> {
        let index = self
            .requests
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| CoreError::not_found("RentalRequest", id))?;
        authorize_transition(&self.requests[index], status, requester_id)?;

        let mut next = self.requests.clone();
        next[index].status = status;
        let updated = next[index].clone();
        save_collection(self.backend.as_ref(), RENTALS_KEY, &next)?;
        self.requests = next;

        debug!(id, %status, requester_id, "Rental status changed");
        self.events.publish(StoreEvent::RentalStatusChanged {
            id: id.to_string(),
            status,
        });
        Ok(updated)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
