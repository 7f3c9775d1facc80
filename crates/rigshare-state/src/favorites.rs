//! # Favorites Store
//!
//! The session's bookmarked equipment ids. Set semantics, kept in the order
//! they were added.

use std::sync::Arc;

use tracing::debug;

use crate::backend::{load_collection, save_collection, StateBackend, FAVORITES_KEY};
use crate::error::StateResult;
use crate::events::{EventBus, StoreEvent};

pub struct FavoritesStore {
    backend: Arc<dyn StateBackend>,
    events: EventBus,
    ids: Vec<String>,
}

impl FavoritesStore {
    pub fn open(backend: Arc<dyn StateBackend>, events: EventBus) -> StateResult<Self> {
        let mut ids: Vec<String> = load_collection(backend.as_ref(), FAVORITES_KEY)?;
        // Older files may hold duplicates.
        let mut seen = std::collections::HashSet::new();
        ids.retain(|id| seen.insert(id.clone()));
        Ok(FavoritesStore {
            backend,
            events,
            ids,
        })
    }

    pub fn is_favorite(&self, equipment_id: &str) -> bool {
        self.ids.iter().any(|id| id == equipment_id)
    }

    pub fn list(&self) -> &[String] {
        &self.ids
    }

    /// Adds `equipment_id`. Returns `false` if it was already there.
    pub fn add(&mut self, equipment_id: &str) -> StateResult<bool> {
        if self.is_favorite(equipment_id) {
            return Ok(false);
        }
        let mut next = self.ids.clone();
        next.push(equipment_id.to_string());
        self.commit(next)?;
        debug!(equipment_id, "Favorite added");
        Ok(true)
    }

    /// Removes `equipment_id`. Returns `false` if it was not there.
    pub fn remove(&mut self, equipment_id: &str) -> StateResult<bool> {
        if !self.is_favorite(equipment_id) {
            return Ok(false);
        }
        let next: Vec<String> = self
            .ids
            .iter()
            .filter(|id| id.as_str() != equipment_id)
            .cloned()
            .collect();
        self.commit(next)?;
        debug!(equipment_id, "Favorite removed");
        Ok(true)
    }

    /// Flips membership and returns the new state.
    pub fn toggle(&mut self, equipment_id: &str) -> StateResult<bool> {
        if self.is_favorite(equipment_id) {
            self.remove(equipment_id)?;
            Ok(false)
        } else {
            self.add(equipment_id)?;
            Ok(true)
        }
    }

    fn commit(&mut self, next: Vec<String>) -> StateResult<()> {
        save_collection(self.backend.as_ref(), FAVORITES_KEY, &next)?;
        self.ids = next;
        self.events.publish(StoreEvent::FavoritesChanged);
        Ok(())
    }
}
