//! # rigshare-core: Pure Domain Logic for RigShare
//!
//! This crate is the **heart** of RigShare. It contains all marketplace rules
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RigShare Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Client                                   │   │
//! │  │    Browse ──► Listing ──► Rental Request ──► Messages           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │         rigshare-state (stores)  /  apps/api (REST)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ rigshare-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────────┐ ┌──────┐ │   │
//! │  │   │  types  │ │  money  │ │ rental  │ │ conversation │ │search│ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────────┘ └──────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Equipment, RentalRequest, Message, Review, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`rental`] - Rental pricing and the status state machine
//! - [`conversation`] - Derived conversations over messages
//! - [`rating`] - Review aggregation
//! - [`search`] - The search/filter/sort engine
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rigshare_core::money::Money;
//! use rigshare_core::rental::quote_total;
//!
//! let daily = Money::from_cents(7500); // $75.00/day
//! let start = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 3, 22).unwrap();
//!
//! let total = quote_total(daily, start, end).unwrap();
//! assert_eq!(total.cents(), 15000); // $150.00 for 2 days
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod conversation;
pub mod error;
pub mod money;
pub mod rating;
pub mod rental;
pub mod search;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Category selector value that disables category filtering.
pub const ALL_CATEGORIES: &str = "All Categories";

/// Minimum mean rating for the `top-rated` filter chip.
pub const TOP_RATED_THRESHOLD: f64 = 4.0;

/// Generates a new entity id.
///
/// UUID v7 ids are time-ordered, so sorting by id approximates creation
/// order even after collections are rebuilt from partitions.
pub fn generate_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
