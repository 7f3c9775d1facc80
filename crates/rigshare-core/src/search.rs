//! # Search Engine
//!
//! Filtering and sorting of the equipment catalog.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  catalog ──► text ──► category ──► location ──► chips ──► sort        │
//! │                                                  (AND)                  │
//! │                                                                         │
//! │  Every stage is a pure predicate. The same (query, catalog, ratings)   │
//! │  always gives the same list in the same order.                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use std::collections::HashMap;
//! use rigshare_core::search::{apply, FilterChip, SearchQuery, SortKey};
//!
//! let query = SearchQuery {
//!     term: "sony".into(),
//!     chips: vec!["under-50".parse::<FilterChip>().unwrap()],
//!     sort: SortKey::PriceLow,
//!     ..SearchQuery::default()
//! };
//! let results = apply(&query, &[], &HashMap::new());
//! assert!(results.is_empty());
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Equipment;
use crate::{ALL_CATEGORIES, TOP_RATED_THRESHOLD};

// =============================================================================
// Filter Chips
// =============================================================================

/// A named boolean filter from the filter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum FilterChip {
    #[serde(rename = "under-50")]
    Under50,
    #[serde(rename = "50-100")]
    From50To100,
    #[serde(rename = "100-200")]
    From100To200,
    #[serde(rename = "over-200")]
    Over200,
    #[serde(rename = "within-5")]
    Within5,
    #[serde(rename = "within-10")]
    Within10,
    #[serde(rename = "within-25")]
    Within25,
    #[serde(rename = "within-50")]
    Within50,
    #[serde(rename = "pickup-only")]
    PickupOnly,
    #[serde(rename = "delivery-available")]
    DeliveryAvailable,
    #[serde(rename = "shipping-available")]
    ShippingAvailable,
    #[serde(rename = "free-delivery")]
    FreeDelivery,
    #[serde(rename = "top-rated")]
    TopRated,
    #[serde(rename = "available-now")]
    AvailableNow,
    #[serde(rename = "instant-book")]
    InstantBook,
}

impl FilterChip {
    pub const ALL: [FilterChip; 15] = [
        FilterChip::Under50,
        FilterChip::From50To100,
        FilterChip::From100To200,
        FilterChip::Over200,
        FilterChip::Within5,
        FilterChip::Within10,
        FilterChip::Within25,
        FilterChip::Within50,
        FilterChip::PickupOnly,
        FilterChip::DeliveryAvailable,
        FilterChip::ShippingAvailable,
        FilterChip::FreeDelivery,
        FilterChip::TopRated,
        FilterChip::AvailableNow,
        FilterChip::InstantBook,
    ];

    /// The chip id used by the filter panel.
    pub fn id(&self) -> &'static str {
        match self {
            FilterChip::Under50 => "under-50",
            FilterChip::From50To100 => "50-100",
            FilterChip::From100To200 => "100-200",
            FilterChip::Over200 => "over-200",
            FilterChip::Within5 => "within-5",
            FilterChip::Within10 => "within-10",
            FilterChip::Within25 => "within-25",
            FilterChip::Within50 => "within-50",
            FilterChip::PickupOnly => "pickup-only",
            FilterChip::DeliveryAvailable => "delivery-available",
            FilterChip::ShippingAvailable => "shipping-available",
            FilterChip::FreeDelivery => "free-delivery",
            FilterChip::TopRated => "top-rated",
            FilterChip::AvailableNow => "available-now",
            FilterChip::InstantBook => "instant-book",
        }
    }

    /// Distance chips are radio-style in the filter panel.
    pub fn is_distance(&self) -> bool {
        matches!(
            self,
            FilterChip::Within5 | FilterChip::Within10 | FilterChip::Within25 | FilterChip::Within50
        )
    }

    /// Whether `item` passes this chip.
    ///
    /// Listings carry no coordinates, availability calendar or booking mode,
    /// so distance, `available-now` and `instant-book` chips pass everything.
    /// Delivery fees are not modelled either: `free-delivery` means delivery
    /// is offered.
    pub fn matches(&self, item: &Equipment, rating: f64) -> bool {
        let price = item.daily_rate();
        let fifty = Money::from_dollars(50);
        let hundred = Money::from_dollars(100);
        let two_hundred = Money::from_dollars(200);
        let options = &item.delivery_options;

        match self {
            FilterChip::Under50 => price < fifty,
            FilterChip::From50To100 => price >= fifty && price <= hundred,
            FilterChip::From100To200 => price > hundred && price <= two_hundred,
            FilterChip::Over200 => price > two_hundred,
            FilterChip::PickupOnly => options.pickup_only(),
            FilterChip::DeliveryAvailable | FilterChip::FreeDelivery => options.delivery,
            FilterChip::ShippingAvailable => options.shipping,
            FilterChip::TopRated => rating >= TOP_RATED_THRESHOLD,
            FilterChip::Within5
            | FilterChip::Within10
            | FilterChip::Within25
            | FilterChip::Within50
            | FilterChip::AvailableNow
            | FilterChip::InstantBook => true,
        }
    }
}

impl fmt::Display for FilterChip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FilterChip {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterChip::ALL
            .iter()
            .copied()
            .find(|chip| chip.id() == s)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "filter".to_string(),
                reason: format!("unknown filter chip '{s}'"),
            })
    }
}

// =============================================================================
// Sort Key
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Catalog order.
    #[default]
    Relevance,
    PriceLow,
    PriceHigh,
    /// Highest mean rating first.
    Rating,
}

impl FromStr for SortKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(SortKey::Relevance),
            "price-low" => Ok(SortKey::PriceLow),
            "price-high" => Ok(SortKey::PriceHigh),
            "rating" => Ok(SortKey::Rating),
            _ => Err(ValidationError::NotAllowed {
                field: "sortBy".to_string(),
                allowed: ["relevance", "price-low", "price-high", "rating"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Query
// =============================================================================

/// Everything the search view lets a user set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct SearchQuery {
    pub term: String,
    /// `All Categories` disables the category filter.
    pub category: String,
    pub location: String,
    pub chips: Vec<FilterChip>,
    pub sort: SortKey,
}

impl Default for SearchQuery {
    fn default() -> Self {
        SearchQuery {
            term: String::new(),
            category: ALL_CATEGORIES.to_string(),
            location: String::new(),
            chips: Vec::new(),
            sort: SortKey::Relevance,
        }
    }
}

impl SearchQuery {
    /// Whether `item` passes every filter stage.
    pub fn matches(&self, item: &Equipment, rating: f64) -> bool {
        let term = self.term.to_lowercase();
        let matches_text = term.is_empty()
            || item.name.to_lowercase().contains(&term)
            || item.description.to_lowercase().contains(&term);

        let matches_category = self.category.is_empty()
            || self.category == ALL_CATEGORIES
            || item.category == self.category;

        let location = self.location.to_lowercase();
        let matches_location =
            location.is_empty() || item.location.to_lowercase().contains(&location);

        matches_text
            && matches_category
            && matches_location
            && self.chips.iter().all(|chip| chip.matches(item, rating))
    }
}

/// Parses chip ids, rejecting the first unknown one.
pub fn parse_chips<I, S>(ids: I) -> Result<Vec<FilterChip>, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut chips: Vec<FilterChip> = Vec::new();
    for id in ids {
        let chip = id.as_ref().parse::<FilterChip>()?;
        if !chips.contains(&chip) {
            chips.push(chip);
        }
    }
    Ok(chips)
}

// =============================================================================
// Apply
// =============================================================================

/// Filters and sorts `catalog`.
///
/// `ratings` maps equipment id to mean rating; missing ids rate `0.0`.
/// Sorting is stable, so ties keep catalog order.
pub fn apply(
    query: &SearchQuery,
    catalog: &[Equipment],
    ratings: &HashMap<String, f64>,
) -> Vec<Equipment> {
    let rating_of = |item: &Equipment| ratings.get(&item.id).copied().unwrap_or(0.0);

    let mut results: Vec<Equipment> = catalog
        .iter()
        .filter(|item| query.matches(item, rating_of(item)))
        .cloned()
        .collect();

    match query.sort {
        SortKey::Relevance => {}
        SortKey::PriceLow => results.sort_by_key(|item| item.price_cents),
        SortKey::PriceHigh => results.sort_by(|a, b| b.price_cents.cmp(&a.price_cents)),
        SortKey::Rating => results.sort_by(|a, b| {
            rating_of(b)
                .partial_cmp(&rating_of(a))
                .unwrap_or(Ordering::Equal)
        }),
    }

    results
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeliveryOptions;
    use chrono::Utc;
    use proptest::prelude::*;

    fn item(id: &str, name: &str, cents: i64, category: &str, location: &str) -> Equipment {
        let now = Utc::now();
        Equipment {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("{name} for rent"),
            price_cents: cents,
            category: category.to_string(),
            location: location.to_string(),
            image: None,
            owner_id: "u-1".to_string(),
            owner_name: "John Doe".to_string(),
            delivery_options: DeliveryOptions {
                pickup: true,
                ..Default::default()
            },
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog() -> Vec<Equipment> {
        vec![
            item("cam", "Sony A7III", 7500, "Cameras", "Los Angeles, CA"),
            item("lens", "Sony 24-70mm Lens", 4500, "Lenses", "Los Angeles, CA"),
            item("tripod", "Manfrotto Tripod", 2500, "Support", "New York, NY"),
            item("red", "RED Komodo", 25000, "Cameras", "Austin, TX"),
            item("light", "Aputure 600d", 15000, "Lighting", "Austin, TX"),
        ]
    }

    fn ids(results: &[Equipment]) -> Vec<&str> {
        results.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_default_query_returns_catalog_order() {
        let results = apply(&SearchQuery::default(), &catalog(), &HashMap::new());
        assert_eq!(ids(&results), vec!["cam", "lens", "tripod", "red", "light"]);
    }

    #[test]
    fn test_text_matches_name_or_description_case_insensitive() {
        let query = SearchQuery {
            term: "SONY".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&query, &catalog(), &HashMap::new())), vec!["cam", "lens"]);

        let query = SearchQuery {
            term: "for rent".to_string(),
            ..Default::default()
        };
        assert_eq!(apply(&query, &catalog(), &HashMap::new()).len(), 5);
    }

    #[test]
    fn test_whitespace_is_matched_literally() {
        let query = SearchQuery {
            term: "  ".to_string(),
            ..Default::default()
        };
        assert!(apply(&query, &catalog(), &HashMap::new()).is_empty());

        let query = SearchQuery {
            term: "600d  ".to_string(),
            ..Default::default()
        };
        assert!(apply(&query, &catalog(), &HashMap::new()).is_empty());

        let query = SearchQuery {
            term: "600d ".to_string(),
            location: ", tx".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&query, &catalog(), &HashMap::new())), vec!["light"]);
    }

    #[test]
    fn test_category_and_location() {
        let query = SearchQuery {
            category: "Cameras".to_string(),
            location: "austin".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&query, &catalog(), &HashMap::new())), vec!["red"]);
    }

    #[test]
    fn test_price_bands() {
        let band = |chip: &str| {
            let query = SearchQuery {
                chips: parse_chips([chip]).unwrap(),
                ..Default::default()
            };
            ids(&apply(&query, &catalog(), &HashMap::new()))
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        };
        assert_eq!(band("under-50"), vec!["lens", "tripod"]);
        assert_eq!(band("50-100"), vec!["cam"]);
        assert_eq!(band("100-200"), vec!["light"]);
        assert_eq!(band("over-200"), vec!["red"]);
    }

    #[test]
    fn test_band_edges() {
        let fifty = item("a", "A", 5000, "X", "Y");
        let hundred = item("b", "B", 10000, "X", "Y");
        let two_hundred = item("c", "C", 20000, "X", "Y");
        assert!(!FilterChip::Under50.matches(&fifty, 0.0));
        assert!(FilterChip::From50To100.matches(&fifty, 0.0));
        assert!(FilterChip::From50To100.matches(&hundred, 0.0));
        assert!(!FilterChip::From100To200.matches(&hundred, 0.0));
        assert!(FilterChip::From100To200.matches(&two_hundred, 0.0));
        assert!(!FilterChip::Over200.matches(&two_hundred, 0.0));
    }

    #[test]
    fn test_chips_are_and_combined() {
        let mut catalog = catalog();
        catalog[1].delivery_options.shipping = true;
        let query = SearchQuery {
            chips: parse_chips(["under-50", "shipping-available"]).unwrap(),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&query, &catalog, &HashMap::new())), vec!["lens"]);
    }

    #[test]
    fn test_pickup_only_excludes_delivery() {
        let mut catalog = catalog();
        catalog[0].delivery_options.delivery = true;
        let query = SearchQuery {
            chips: vec![FilterChip::PickupOnly],
            ..Default::default()
        };
        let results = apply(&query, &catalog, &HashMap::new());
        assert!(!ids(&results).contains(&"cam"));
        assert_eq!(results.len(), 4);
    }

    #[test]
    fn test_distance_chip_passes_everything() {
        let query = SearchQuery {
            chips: vec![FilterChip::Within5],
            ..Default::default()
        };
        assert_eq!(apply(&query, &catalog(), &HashMap::new()).len(), 5);
    }

    #[test]
    fn test_top_rated_uses_threshold() {
        let mut ratings = HashMap::new();
        ratings.insert("cam".to_string(), 4.0);
        ratings.insert("lens".to_string(), 3.9);
        let query = SearchQuery {
            chips: vec![FilterChip::TopRated],
            ..Default::default()
        };
        assert_eq!(ids(&apply(&query, &catalog(), &ratings)), vec!["cam"]);
    }

    #[test]
    fn test_sort_by_price() {
        let query = SearchQuery {
            sort: SortKey::PriceLow,
            ..Default::default()
        };
        assert_eq!(
            ids(&apply(&query, &catalog(), &HashMap::new())),
            vec!["tripod", "lens", "cam", "light", "red"]
        );

        let query = SearchQuery {
            sort: SortKey::PriceHigh,
            ..Default::default()
        };
        assert_eq!(
            ids(&apply(&query, &catalog(), &HashMap::new())),
            vec!["red", "light", "cam", "lens", "tripod"]
        );
    }

    #[test]
    fn test_sort_by_rating_is_stable() {
        let mut ratings = HashMap::new();
        ratings.insert("tripod".to_string(), 5.0);
        ratings.insert("light".to_string(), 5.0);
        ratings.insert("lens".to_string(), 2.0);
        let query = SearchQuery {
            sort: SortKey::Rating,
            ..Default::default()
        };
        assert_eq!(
            ids(&apply(&query, &catalog(), &ratings)),
            vec!["tripod", "light", "lens", "cam", "red"]
        );
    }

    #[test]
    fn test_unknown_chip_rejected() {
        assert!(parse_chips(["under-50", "cheap"]).is_err());
        assert!("within-100".parse::<FilterChip>().is_err());
    }

    #[test]
    fn test_chip_ids_round_trip_through_serde() {
        for chip in FilterChip::ALL {
            let json = serde_json::to_string(&chip).unwrap();
            assert_eq!(json, format!("\"{}\"", chip.id()));
        }
        let key: SortKey = serde_json::from_str("\"price-low\"").unwrap();
        assert_eq!(key, SortKey::PriceLow);
    }

    proptest! {
        #[test]
        fn prop_search_is_deterministic(
            term in "[a-z ]{0,6}",
            chip_mask in 0u16..(1 << 15),
            sort in 0usize..4,
        ) {
            let chips: Vec<FilterChip> = FilterChip::ALL
                .iter()
                .enumerate()
                .filter(|(i, _)| chip_mask & (1 << i) != 0)
                .map(|(_, c)| *c)
                .collect();
            let sort = [SortKey::Relevance, SortKey::PriceLow, SortKey::PriceHigh, SortKey::Rating][sort];
            let query = SearchQuery { term, chips, sort, ..Default::default() };
            let mut ratings = HashMap::new();
            ratings.insert("cam".to_string(), 4.5);

            let catalog = catalog();
            let first = apply(&query, &catalog, &ratings);
            let second = apply(&query, &catalog, &ratings);
            prop_assert_eq!(first, second);
        }
    }
}
