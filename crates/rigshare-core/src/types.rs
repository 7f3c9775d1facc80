//! # Domain Types
//!
//! Core domain types used throughout RigShare.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Equipment     │◄──│  RentalRequest  │◄──│    Message      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID v7)   │   │  equipment_id   │   │  reference      │       │
//! │  │  owner_id       │   │  renter_id      │   │  (rental id)    │       │
//! │  │  price_cents    │   │  status         │   │  read           │       │
//! │  └────────▲────────┘   └─────────────────┘   └─────────────────┘       │
//! │           │                                                             │
//! │  ┌────────┴────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Review      │   │  UserProfile    │   │  Conversation   │       │
//! │  │  equipment_id   │   │  id, name       │   │  (derived only) │       │
//! │  │  rating 1..=5   │   │  email, bio     │   │  participants   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Arrows are id references resolved at read time, never pointers.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Denormalized Names
//! `owner_name`, `renter_name`, `sender_name` and friends are caches taken at
//! write time. Readers that care about freshness go through [`DisplayNames`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Equipment
// =============================================================================

/// How a renter can receive a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliveryOptions {
    pub pickup: bool,
    pub delivery: bool,
    pub shipping: bool,
}

impl DeliveryOptions {
    /// Pickup is the only way to get the item.
    pub fn pickup_only(&self) -> bool {
        self.pickup && !self.delivery && !self.shipping
    }
}

/// A rentable listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Equipment {
    /// Unique identifier (UUID v7).
    pub id: String,

    pub name: String,

    pub description: String,

    /// Daily rate in cents.
    pub price_cents: i64,

    /// Free-form category ("Cameras", "Lighting", ...).
    pub category: String,

    /// Free-text location ("Los Angeles, CA").
    pub location: String,

    /// Image URI, absent until the owner uploads one.
    pub image: Option<String>,

    pub owner_id: String,

    /// Cached display name of the owner. May be stale.
    pub owner_name: String,

    #[serde(default)]
    pub delivery_options: DeliveryOptions,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Equipment {
    /// Returns the daily rate as Money.
    #[inline]
    pub fn daily_rate(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether `user_id` owns this listing.
    #[inline]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

/// Fields supplied when creating a listing.
///
/// Id, owner and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewEquipment {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    pub category: String,
    pub location: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub delivery_options: DeliveryOptions,
}

impl NewEquipment {
    /// Strips surrounding whitespace from name, category and location.
    ///
    /// Every store applies this before writing so the same input is stored
    /// identically everywhere.
    pub fn trimmed(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.category = self.category.trim().to_string();
        self.location = self.location.trim().to_string();
        self
    }
}

/// Partial update of a listing's mutable fields.
///
/// `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct EquipmentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
    pub delivery_options: Option<DeliveryOptions>,
}

impl EquipmentPatch {
    /// Applies the patch in place. Timestamps are the caller's concern.
    ///
    /// Name, category and location are trimmed the same way as
    /// [`NewEquipment::trimmed`].
    pub fn apply_to(&self, equipment: &mut Equipment) {
        if let Some(name) = &self.name {
            equipment.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            equipment.description = description.clone();
        }
        if let Some(price_cents) = self.price_cents {
            equipment.price_cents = price_cents;
        }
        if let Some(category) = &self.category {
            equipment.category = category.trim().to_string();
        }
        if let Some(location) = &self.location {
            equipment.location = location.trim().to_string();
        }
        if let Some(image) = &self.image {
            equipment.image = Some(image.clone());
        }
        if let Some(options) = self.delivery_options {
            equipment.delivery_options = options;
        }
    }
}

// =============================================================================
// Rental Status
// =============================================================================

/// Lifecycle of a rental request.
///
/// ```text
/// pending ──► approved ──► completed
///    │
///    └──────► rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl RentalStatus {
    /// No transition leaves a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RentalStatus::Rejected | RentalStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Pending => "pending",
            RentalStatus::Approved => "approved",
            RentalStatus::Rejected => "rejected",
            RentalStatus::Completed => "completed",
        }
    }
}

impl Default for RentalStatus {
    fn default() -> Self {
        RentalStatus::Pending
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RentalStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RentalStatus::Pending),
            "approved" => Ok(RentalStatus::Approved),
            "rejected" => Ok(RentalStatus::Rejected),
            "completed" => Ok(RentalStatus::Completed),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: ["pending", "approved", "rejected", "completed"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

/// Which side of a rental a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RentalRole {
    Owner,
    Renter,
}

// =============================================================================
// Rental Request
// =============================================================================

/// A renter's proposal to rent a listing for a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RentalRequest {
    pub id: String,
    pub equipment_id: String,
    /// Listing name at request time (frozen).
    pub equipment_name: String,
    pub owner_id: String,
    pub owner_name: String,
    pub renter_id: String,
    pub renter_name: String,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    /// Inclusive of the start date rule: end >= start.
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    /// Daily rate × day count at request time.
    pub total_price_cents: i64,
    pub status: RentalStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RentalRequest {
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }

    /// Whether `user_id` is on the given side of this rental.
    pub fn involves(&self, user_id: &str, role: RentalRole) -> bool {
        match role {
            RentalRole::Owner => self.owner_id == user_id,
            RentalRole::Renter => self.renter_id == user_id,
        }
    }
}

/// The slice of a listing a rental request snapshots.
///
/// Lets the rentals store price a request without depending on the
/// listings store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentalSubject {
    pub equipment_id: String,
    pub equipment_name: String,
    pub owner_id: String,
    pub owner_name: String,
    pub daily_rate: Money,
}

impl From<&Equipment> for RentalSubject {
    fn from(equipment: &Equipment) -> Self {
        RentalSubject {
            equipment_id: equipment.id.clone(),
            equipment_name: equipment.name.clone(),
            owner_id: equipment.owner_id.clone(),
            owner_name: equipment.owner_name.clone(),
            daily_rate: equipment.daily_rate(),
        }
    }
}

// =============================================================================
// Messages
// =============================================================================

/// Structured link from a message to another entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "camelCase")]
#[ts(export)]
pub enum MessageReference {
    RentalRequest { id: String },
}

impl MessageReference {
    /// The referenced rental request id, if this is a rental link.
    pub fn rental_request_id(&self) -> Option<&str> {
        match self {
            MessageReference::RentalRequest { id } => Some(id),
        }
    }
}

/// A direct message between two users. Immutable except for `read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub receiver_id: String,
    pub receiver_name: String,
    pub content: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub reference: Option<MessageReference>,
}

impl Message {
    /// Whether the message travels between `a` and `b` in either direction.
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }

    /// Whether `user_id` sent or received this message.
    pub fn involves(&self, user_id: &str) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }
}

/// A derived grouping of messages by participant pair. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Conversation {
    /// Sorted participant ids joined with `-`.
    pub id: String,
    /// Exactly two ids, sorted.
    pub participants: Vec<String>,
    pub last_message: Message,
    /// Unread messages addressed to the viewing user.
    pub unread_count: usize,
}

impl Conversation {
    /// The participant that is not `viewer`.
    pub fn other_participant(&self, viewer: &str) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| p.as_str() != viewer)
            .map(String::as_str)
    }
}

// =============================================================================
// Reviews
// =============================================================================

/// A rating and comment left on a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Review {
    pub id: String,
    pub equipment_id: String,
    /// Author id.
    pub user_id: String,
    pub user_name: String,
    /// 1..=5
    pub rating: u8,
    pub comment: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// "Was this helpful?" counter.
    #[serde(default)]
    pub helpful: u32,
}

/// Fields supplied when posting a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewReview {
    pub equipment_id: String,
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ReviewPatch {
    pub rating: Option<u8>,
    pub comment: Option<String>,
}

// =============================================================================
// Users
// =============================================================================

/// Public profile of a user. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Editable profile fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(email) = &self.email {
            profile.email = email.clone();
        }
        if self.phone.is_some() {
            profile.phone = self.phone.clone();
        }
        if self.location.is_some() {
            profile.location = self.location.clone();
        }
        if self.bio.is_some() {
            profile.bio = self.bio.clone();
        }
        if self.avatar.is_some() {
            profile.avatar = self.avatar.clone();
        }
    }
}

// =============================================================================
// Display Name Lookup
// =============================================================================

/// Source of current display names, used to refresh denormalized caches.
pub trait DisplayNames {
    fn display_name(&self, user_id: &str) -> Option<String>;
}

impl DisplayNames for HashMap<String, String> {
    fn display_name(&self, user_id: &str) -> Option<String> {
        self.get(user_id).cloned()
    }
}

impl DisplayNames for [UserProfile] {
    fn display_name(&self, user_id: &str) -> Option<String> {
        self.iter()
            .find(|u| u.id == user_id)
            .map(|u| u.name.clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
