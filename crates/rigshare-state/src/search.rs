//! # Search Session
//!
//! The live search query behind the browse page. Results are recomputed
//! from the current catalog and ratings on every read.

use std::collections::HashMap;

use rigshare_core::search::{apply, FilterChip, SearchQuery, SortKey};
use rigshare_core::{Equipment, ValidationError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSession {
    query: SearchQuery,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn set_term(&mut self, term: impl Into<String>) {
        self.query.term = term.into();
    }

    /// `All Categories` clears the category filter.
    pub fn set_category(&mut self, category: impl Into<String>) {
        self.query.category = category.into();
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.query.location = location.into();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.query.sort = sort;
    }

    /// Flips a chip. Turning on a distance chip turns off the others.
    ///
    /// Returns whether the chip is now active.
    pub fn toggle_chip(&mut self, chip: FilterChip) -> bool {
        if let Some(pos) = self.query.chips.iter().position(|c| *c == chip) {
            self.query.chips.remove(pos);
            return false;
        }
        if chip.is_distance() {
            self.query.chips.retain(|c| !c.is_distance());
        }
        self.query.chips.push(chip);
        true
    }

    /// [`toggle_chip`](Self::toggle_chip) by filter panel id.
    pub fn toggle_chip_id(&mut self, id: &str) -> Result<bool, ValidationError> {
        let chip = id.parse::<FilterChip>()?;
        Ok(self.toggle_chip(chip))
    }

    pub fn is_active(&self, chip: FilterChip) -> bool {
        self.query.chips.contains(&chip)
    }

    pub fn clear_filters(&mut self) {
        self.query.chips.clear();
    }

    /// Resets everything, including term and sort.
    pub fn reset(&mut self) {
        self.query = SearchQuery::default();
    }

    pub fn results(&self, catalog: &[Equipment], ratings: &HashMap<String, f64>) -> Vec<Equipment> {
        apply(&self.query, catalog, ratings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigshare_core::ALL_CATEGORIES;

    #[test]
    fn test_distance_chips_are_exclusive() {
        let mut session = SearchSession::new();
        assert!(session.toggle_chip(FilterChip::Within5));
        assert!(session.toggle_chip(FilterChip::Under50));
        assert!(session.toggle_chip(FilterChip::Within25));

        assert!(!session.is_active(FilterChip::Within5));
        assert!(session.is_active(FilterChip::Within25));
        assert!(session.is_active(FilterChip::Under50));
    }

    #[test]
    fn test_toggle_off() {
        let mut session = SearchSession::new();
        assert!(session.toggle_chip_id("top-rated").unwrap());
        assert!(!session.toggle_chip_id("top-rated").unwrap());
        assert!(session.query().chips.is_empty());
    }

    #[test]
    fn test_unknown_chip_id() {
        let mut session = SearchSession::new();
        assert!(session.toggle_chip_id("cheap").is_err());
    }

    #[test]
    fn test_reset() {
        let mut session = SearchSession::new();
        session.set_term("sony");
        session.set_category("Cameras");
        session.set_sort(SortKey::PriceHigh);
        session.toggle_chip(FilterChip::PickupOnly);

        session.clear_filters();
        assert!(session.query().chips.is_empty());
        assert_eq!(session.query().term, "sony");

        session.reset();
        assert_eq!(session.query().category, ALL_CATEGORIES);
        assert_eq!(session.query().sort, SortKey::Relevance);
    }
}
