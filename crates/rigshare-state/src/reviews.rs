//! # Reviews Store
//!
//! Ratings are recomputed from the review list on every read; nothing is
//! cached per listing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use rigshare_core::rating::{average_rating, ratings_index};
use rigshare_core::validation::{validate_comment, validate_rating, validate_review_patch};
use rigshare_core::{generate_id, CoreError, NewReview, Review, ReviewPatch, ValidationError};

use crate::backend::{load_collection, save_collection, StateBackend, REVIEWS_KEY};
use crate::error::StateResult;
use crate::events::{EventBus, StoreEvent};

pub struct ReviewStore {
    backend: Arc<dyn StateBackend>,
    events: EventBus,
    reviews: Vec<Review>,
}

impl ReviewStore {
    pub fn open(backend: Arc<dyn StateBackend>, events: EventBus) -> StateResult<Self> {
        let reviews: Vec<Review> = load_collection(backend.as_ref(), REVIEWS_KEY)?;
        debug!(count = reviews.len(), "Reviews loaded");
        Ok(ReviewStore {
            backend,
            events,
            reviews,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Review> {
        self.reviews.iter().find(|r| r.id == id)
    }

    pub fn list_all(&self) -> &[Review] {
        &self.reviews
    }

    /// Reviews of one listing. Empty for unknown or deleted listings.
    pub fn by_equipment(&self, equipment_id: &str) -> Vec<&Review> {
        self.reviews
            .iter()
            .filter(|r| r.equipment_id == equipment_id)
            .collect()
    }

    /// Mean rating, `0.0` when there are no reviews.
    pub fn average_rating(&self, equipment_id: &str) -> f64 {
        average_rating(&self.reviews, equipment_id)
    }

    /// Mean rating per reviewed listing.
    pub fn ratings(&self) -> HashMap<String, f64> {
        ratings_index(&self.reviews)
    }

    /// Posts a review authored by `user_id`.
    pub fn add(&mut self, review: NewReview, user_id: &str, user_name: &str) -> StateResult<Review> {
        if user_id.trim().is_empty() {
            return Err(CoreError::Unauthenticated.into());
        }
        if review.equipment_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "equipmentId".to_string(),
            }
            .into());
        }
        validate_rating(review.rating)?;
        validate_comment(&review.comment)?;

        let review = Review {
            id: generate_id(),
            equipment_id: review.equipment_id,
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            rating: review.rating,
            comment: review.comment,
            date: Utc::now().date_naive(),
            helpful: 0,
        };

        let mut next = self.reviews.clone();
        next.push(review.clone());
        self.commit(next)?;

        debug!(id = %review.id, equipment_id = %review.equipment_id, rating = review.rating, "Review added");
        self.events.publish(StoreEvent::ReviewAdded {
            id: review.id.clone(),
            equipment_id: review.equipment_id.clone(),
        });
        Ok(review)
    }

    /// Edits a review. Only its author may.
    pub fn update(&mut self, id: &str, patch: ReviewPatch, requester_id: &str) -> StateResult<Review> {
        let index = self.authored_index(id, requester_id)?;
        validate_review_patch(&patch)?;

        let mut next = self.reviews.clone();
        let review = &mut next[index];
        if let Some(rating) = patch.rating {
            review.rating = rating;
        }
        if let Some(comment) = patch.comment {
            review.comment = comment;
        }
        let updated = review.clone();
        self.commit(next)?;

        debug!(id, "Review updated");
        self.events.publish(StoreEvent::ReviewUpdated {
            id: id.to_string(),
            equipment_id: updated.equipment_id.clone(),
        });
        Ok(updated)
    }

    /// Deletes a review. Only its author may.
    pub fn remove(&mut self, id: &str, requester_id: &str) -> StateResult<Review> {
        let index = self.authored_index(id, requester_id)?;

        let mut next = self.reviews.clone();
        let removed = next.remove(index);
        self.commit(next)?;

        debug!(id, "Review removed");
        self.events.publish(StoreEvent::ReviewRemoved {
            id: id.to_string(),
            equipment_id: removed.equipment_id.clone(),
        });
        Ok(removed)
    }

    /// Bumps the "helpful" counter. Anyone may.
    pub fn mark_helpful(&mut self, id: &str) -> StateResult<Review> {
        let index = self
            .reviews
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| CoreError::not_found("Review", id))?;

        let mut next = self.reviews.clone();
        next[index].helpful = next[index].helpful.saturating_add(1);
        let updated = next[index].clone();
        self.commit(next)?;

        self.events.publish(StoreEvent::ReviewUpdated {
            id: id.to_string(),
            equipment_id: updated.equipment_id.clone(),
        });
        Ok(updated)
    }

    fn authored_index(&self, id: &str, requester_id: &str) -> StateResult<usize> {
        if requester_id.trim().is_empty() {
            return Err(CoreError::Unauthenticated.into());
        }
        let index = self
            .reviews
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| CoreError::not_found("Review", id))?;
        if self.reviews[index].user_id != requester_id {
            return Err(CoreError::unauthorized("Review", id, requester_id).into());
        }
        Ok(index)
    }

    fn commit(&mut self, next: Vec<Review>) -> StateResult<()> {
        save_collection(self.backend.as_ref(), REVIEWS_KEY, &next)?;
        self.reviews = next;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::error::StateError;

    fn store() -> ReviewStore {
        ReviewStore::open(Arc::new(MemoryBackend::new()), EventBus::default()).unwrap()
    }

    fn new_review(equipment_id: &str, rating: u8) -> NewReview {
        NewReview {
            equipment_id: equipment_id.to_string(),
            rating,
            comment: "Great condition".to_string(),
        }
    }

    fn core_err(err: StateError) -> CoreError {
        match err {
            StateError::Core(e) => e,
            other => panic!("expected core error, got {other:?}"),
        }
    }

    #[test]
    fn test_average_rating() {
        let mut store = store();
        assert_eq!(store.average_rating("e-1"), 0.0);

        store.add(new_review("e-1", 5), "u-2", "Jane").unwrap();
        store.add(new_review("e-1", 4), "u-3", "Sam").unwrap();
        store.add(new_review("e-2", 1), "u-3", "Sam").unwrap();

        assert!((store.average_rating("e-1") - 4.5).abs() < f64::EPSILON);
        assert_eq!(store.by_equipment("e-1").len(), 2);
        assert_eq!(store.ratings().len(), 2);
    }

    #[test]
    fn test_rating_bounds() {
        let mut store = store();
        for bad in [0, 6] {
            let err = store.add(new_review("e-1", bad), "u-2", "Jane").unwrap_err();
            assert!(matches!(core_err(err), CoreError::Validation(_)));
        }
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn test_only_author_edits_or_removes() {
        let mut store = store();
        let review = store.add(new_review("e-1", 3), "u-2", "Jane").unwrap();

        let patch = ReviewPatch {
            rating: Some(5),
            comment: None,
        };
        let err = store.update(&review.id, patch.clone(), "u-3").unwrap_err();
        assert!(matches!(core_err(err), CoreError::Unauthorized { .. }));

        let updated = store.update(&review.id, patch, "u-2").unwrap();
        assert_eq!(updated.rating, 5);
        assert_eq!(updated.comment, "Great condition");

        let err = store.remove(&review.id, "u-3").unwrap_err();
        assert!(matches!(core_err(err), CoreError::Unauthorized { .. }));
        store.remove(&review.id, "u-2").unwrap();
        assert!(store.get(&review.id).is_none());
    }

    #[test]
    fn test_update_validates_rating() {
        let mut store = store();
        let review = store.add(new_review("e-1", 3), "u-2", "Jane").unwrap();
        let patch = ReviewPatch {
            rating: Some(9),
            comment: None,
        };
        assert!(store.update(&review.id, patch, "u-2").is_err());
        assert_eq!(store.get(&review.id).unwrap().rating, 3);
    }

    #[test]
    fn test_mark_helpful() {
        let mut store = store();
        let review = store.add(new_review("e-1", 4), "u-2", "Jane").unwrap();
        store.mark_helpful(&review.id).unwrap();
        let updated = store.mark_helpful(&review.id).unwrap();
        assert_eq!(updated.helpful, 2);

        assert!(store.mark_helpful("missing").is_err());
    }
}
