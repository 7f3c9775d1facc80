//! # Validation Module
//!
//! Input validation for listings, reviews and messages.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Layer 1: Web client forms (required fields, number inputs)            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Stores / REST handlers                                       │
//! │  └── THIS MODULE: marketplace field rules                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite (NOT NULL, CHECK, FOREIGN KEY)                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rigshare_core::validation::{validate_listing_name, validate_rating};
//!
//! assert!(validate_listing_name("Sony A7III").is_ok());
//! assert!(validate_rating(6).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{EquipmentPatch, NewEquipment, ProfileUpdate, ReviewPatch};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted listing name.
pub const MAX_NAME_LEN: usize = 200;

/// Longest accepted message or review body.
pub const MAX_TEXT_LEN: usize = 5000;

// =============================================================================
// String Validators
// =============================================================================

fn required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn at_most(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates a listing name.
///
/// ## Rules
/// - Must not be blank
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use rigshare_core::validation::validate_listing_name;
///
/// assert!(validate_listing_name("Canon 24-70mm f/2.8").is_ok());
/// assert!(validate_listing_name("   ").is_err());
/// assert!(validate_listing_name(&"A".repeat(201)).is_err());
/// ```
pub fn validate_listing_name(name: &str) -> ValidationResult<()> {
    required("name", name)?;
    at_most("name", name.trim(), MAX_NAME_LEN)
}

/// Validates message content: non-blank, bounded.
pub fn validate_message_content(content: &str) -> ValidationResult<()> {
    required("content", content)?;
    at_most("content", content, MAX_TEXT_LEN)
}

/// Validates a review comment. Empty comments are allowed.
pub fn validate_comment(comment: &str) -> ValidationResult<()> {
    at_most("comment", comment, MAX_TEXT_LEN)
}

/// Validates an image URI.
///
/// Only checks for a scheme; upload handling lives elsewhere.
pub fn validate_image_uri(uri: &str) -> ValidationResult<()> {
    required("image", uri)?;
    let has_scheme = uri
        .split_once(':')
        .map(|(scheme, _)| {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        })
        .unwrap_or(false);
    // Site-relative paths like /uploads/a.jpg are what the upload route returns.
    if !has_scheme && !uri.starts_with('/') {
        return Err(ValidationError::InvalidFormat {
            field: "image".to_string(),
            reason: "must be an absolute URI or a site path".to_string(),
        });
    }
    Ok(())
}

/// Validates a display name for a user account.
pub fn validate_user_name(name: &str) -> ValidationResult<()> {
    required("name", name)?;
    at_most("name", name.trim(), MAX_NAME_LEN)
}

/// Validates an email address. Only the shape `local@domain` is checked.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    required("email", email)?;
    let well_formed = email
        .trim()
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && !domain.is_empty() && !domain.contains('@'))
        .unwrap_or(false);
    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a daily rate in cents. Must be > 0.
///
/// ## Example
/// ```rust
/// use rigshare_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(7500).is_ok());
/// assert!(validate_price_cents(0).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Validates a review rating (1..=5).
pub fn validate_rating(rating: u8) -> ValidationResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: 1,
            max: 5,
        });
    }
    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates every field of a new listing.
pub fn validate_new_equipment(listing: &NewEquipment) -> ValidationResult<()> {
    validate_listing_name(&listing.name)?;
    validate_price_cents(listing.price_cents)?;
    required("category", &listing.category)?;
    required("location", &listing.location)?;
    if let Some(image) = &listing.image {
        validate_image_uri(image)?;
    }
    Ok(())
}

/// Validates only the fields present in a listing patch.
pub fn validate_equipment_patch(patch: &EquipmentPatch) -> ValidationResult<()> {
    if let Some(name) = &patch.name {
        validate_listing_name(name)?;
    }
    if let Some(cents) = patch.price_cents {
        validate_price_cents(cents)?;
    }
    if let Some(category) = &patch.category {
        required("category", category)?;
    }
    if let Some(location) = &patch.location {
        required("location", location)?;
    }
    if let Some(image) = &patch.image {
        validate_image_uri(image)?;
    }
    Ok(())
}

pub fn validate_review_patch(patch: &ReviewPatch) -> ValidationResult<()> {
    if let Some(rating) = patch.rating {
        validate_rating(rating)?;
    }
    if let Some(comment) = &patch.comment {
        validate_comment(comment)?;
    }
    Ok(())
}

pub fn validate_profile_update(update: &ProfileUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_user_name(name)?;
    }
    if let Some(email) = &update.email {
        validate_email(email)?;
    }
    if let Some(avatar) = &update.avatar {
        validate_image_uri(avatar)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeliveryOptions;

    fn listing() -> NewEquipment {
        NewEquipment {
            name: "Aputure 300d".to_string(),
            description: "LED light".to_string(),
            price_cents: 4000,
            category: "Lighting".to_string(),
            location: "Brooklyn, NY".to_string(),
            image: None,
            delivery_options: DeliveryOptions::default(),
        }
    }

    #[test]
    fn test_validate_listing_name() {
        assert!(validate_listing_name("Sony A7III").is_ok());
        assert!(validate_listing_name(&"A".repeat(200)).is_ok());

        assert!(validate_listing_name("").is_err());
        assert!(validate_listing_name("   ").is_err());
        assert!(validate_listing_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(1).is_ok());
        assert!(validate_price_cents(0).is_err());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_rating() {
        for ok in 1..=5 {
            assert!(validate_rating(ok).is_ok());
        }
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_validate_message_content() {
        assert!(validate_message_content("Is this available?").is_ok());
        assert!(validate_message_content("").is_err());
        assert!(validate_message_content(" \n").is_err());
    }

    #[test]
    fn test_validate_image_uri() {
        assert!(validate_image_uri("https://cdn.example.com/a.jpg").is_ok());
        assert!(validate_image_uri("/uploads/a.jpg").is_ok());
        assert!(validate_image_uri("data:image/png;base64,AAAA").is_ok());
        assert!(validate_image_uri("a.jpg").is_err());
        assert!(validate_image_uri("").is_err());
    }

    #[test]
    fn test_validate_new_equipment() {
        assert!(validate_new_equipment(&listing()).is_ok());

        let mut missing_location = listing();
        missing_location.location = String::new();
        assert_eq!(
            validate_new_equipment(&missing_location),
            Err(ValidationError::Required {
                field: "location".to_string()
            })
        );

        let mut free = listing();
        free.price_cents = 0;
        assert!(validate_new_equipment(&free).is_err());
    }

    #[test]
    fn test_validate_patch_checks_present_fields_only() {
        assert!(validate_equipment_patch(&EquipmentPatch::default()).is_ok());
        let patch = EquipmentPatch {
            category: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(validate_equipment_patch(&patch).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("john@example.com").is_ok());
        assert!(validate_email("john").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("john@").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn test_validate_profile_update() {
        assert!(validate_profile_update(&ProfileUpdate::default()).is_ok());
        let update = ProfileUpdate {
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(validate_profile_update(&update).is_err());
    }
}
