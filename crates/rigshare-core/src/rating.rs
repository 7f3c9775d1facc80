//! Review aggregation.

use std::collections::HashMap;

use crate::types::Review;

/// Mean rating of the reviews for `equipment_id`, or `0.0` when there are none.
///
/// ## Example
/// ```rust
/// use rigshare_core::rating::average_rating;
///
/// assert_eq!(average_rating(&[], "e-1"), 0.0);
/// ```
pub fn average_rating(reviews: &[Review], equipment_id: &str) -> f64 {
    let (sum, count) = reviews
        .iter()
        .filter(|r| r.equipment_id == equipment_id)
        .fold((0u64, 0u64), |(sum, count), r| {
            (sum + u64::from(r.rating), count + 1)
        });
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Mean rating per equipment id, for every listing that has reviews.
///
/// Listings absent from the map have an average of `0.0`.
pub fn ratings_index(reviews: &[Review]) -> HashMap<String, f64> {
    let mut totals: HashMap<&str, (u64, u64)> = HashMap::new();
    for review in reviews {
        let entry = totals.entry(review.equipment_id.as_str()).or_insert((0, 0));
        entry.0 += u64::from(review.rating);
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|(id, (sum, count))| (id.to_string(), sum as f64 / count as f64))
        .collect()
}
