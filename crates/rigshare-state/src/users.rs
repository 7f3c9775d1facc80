//! # Users Directory
//!
//! Profiles known to this client. Doubles as the display-name source when
//! refreshing the denormalized `owner_name` / `renter_name` caches.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use rigshare_core::validation::{validate_email, validate_profile_update, validate_user_name};
use rigshare_core::{generate_id, CoreError, DisplayNames, ProfileUpdate, UserProfile};

use crate::backend::{load_collection, save_collection, StateBackend, USERS_KEY};
use crate::error::StateResult;
use crate::events::{EventBus, StoreEvent};

pub struct UserDirectory {
    backend: Arc<dyn StateBackend>,
    events: EventBus,
    users: Vec<UserProfile>,
}

impl UserDirectory {
    pub fn open(backend: Arc<dyn StateBackend>, events: EventBus) -> StateResult<Self> {
        let users: Vec<UserProfile> = load_collection(backend.as_ref(), USERS_KEY)?;
        debug!(count = users.len(), "Users loaded");
        Ok(UserDirectory {
            backend,
            events,
            users,
        })
    }

    pub fn get(&self, id: &str) -> Option<&UserProfile> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn list(&self) -> &[UserProfile] {
        &self.users
    }

    /// Creates a profile with a fresh id.
    pub fn register(&mut self, name: &str, email: &str) -> StateResult<UserProfile> {
        validate_user_name(name)?;
        validate_email(email)?;

        let profile = UserProfile {
            id: generate_id(),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            phone: None,
            location: None,
            bio: None,
            avatar: None,
            created_at: Utc::now(),
        };
        self.upsert(profile.clone())?;
        Ok(profile)
    }

    /// Inserts or replaces a profile by id (e.g. one fetched from the API).
    pub fn upsert(&mut self, profile: UserProfile) -> StateResult<()> {
        let mut next = self.users.clone();
        match next.iter_mut().find(|u| u.id == profile.id) {
            Some(existing) => *existing = profile.clone(),
            None => next.push(profile.clone()),
        }
        self.commit(next)?;
        debug!(id = %profile.id, "Profile stored");
        self.events.publish(StoreEvent::ProfileUpdated { id: profile.id });
        Ok(())
    }

    /// Edits a profile. Users may only edit themselves.
    pub fn update(
        &mut self,
        id: &str,
        update: &ProfileUpdate,
        requester_id: &str,
    ) -> StateResult<UserProfile> {
        if requester_id.trim().is_empty() {
            return Err(CoreError::Unauthenticated.into());
        }
        let index = self
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| CoreError::not_found("User", id))?;
        if id != requester_id {
            return Err(CoreError::unauthorized("User", id, requester_id).into());
        }
        validate_profile_update(update)?;

        let mut next = self.users.clone();
        update.apply_to(&mut next[index]);
        let updated = next[index].clone();
        self.commit(next)?;

        debug!(id, "Profile updated");
        self.events.publish(StoreEvent::ProfileUpdated { id: id.to_string() });
        Ok(updated)
    }

    fn commit(&mut self, next: Vec<UserProfile>) -> StateResult<()> {
        save_collection(self.backend.as_ref(), USERS_KEY, &next)?;
        self.users = next;
        Ok(())
    }
}

impl DisplayNames for UserDirectory {
    fn display_name(&self, user_id: &str) -> Option<String> {
        self.get(user_id).map(|u| u.name.clone())
    }
}
