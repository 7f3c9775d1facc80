//! # Rental Module
//!
//! Pricing and the status state machine for rental requests.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────┐  owner   ┌──────────┐  owner|renter  ┌───────────┐      │
//! │   │ pending │ ───────► │ approved │ ─────────────► │ completed │      │
//! │   └────┬────┘          └──────────┘                └───────────┘      │
//! │        │ owner                                                          │
//! │        ▼                                                                │
//! │   ┌──────────┐                                                          │
//! │   │ rejected │          rejected and completed are terminal             │
//! │   └──────────┘                                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Edge legality is checked before authority: asking to move a completed
//! rental anywhere is `InvalidTransition` no matter who asks.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{RentalRequest, RentalStatus, RentalSubject};

// =============================================================================
// Pricing
// =============================================================================

/// Number of billable days between two calendar dates.
///
/// Whole days from `start` to `end`; a same-day range is zero days.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use rigshare_core::rental::rental_days;
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
/// assert_eq!(rental_days(d(20), d(22)).unwrap(), 2);
/// assert_eq!(rental_days(d(20), d(20)).unwrap(), 0);
/// assert!(rental_days(d(22), d(20)).is_err());
/// ```
pub fn rental_days(start: NaiveDate, end: NaiveDate) -> CoreResult<u32> {
    if end < start {
        return Err(CoreError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    let days = (end - start).num_days();
    u32::try_from(days).map_err(|_| {
        CoreError::Validation(ValidationError::OutOfRange {
            field: "days".to_string(),
            min: 0,
            max: i64::from(u32::MAX),
        })
    })
}

/// Total price for renting at `daily_rate` from `start` to `end`.
pub fn quote_total(daily_rate: Money, start: NaiveDate, end: NaiveDate) -> CoreResult<Money> {
    let days = rental_days(start, end)?;
    daily_rate.times_days(days).ok_or_else(|| {
        CoreError::Validation(ValidationError::OutOfRange {
            field: "totalPrice".to_string(),
            min: 0,
            max: i64::MAX,
        })
    })
}

// =============================================================================
// Request Construction
// =============================================================================

/// Who is asking to rent, and for when.
#[derive(Debug, Clone)]
pub struct RentalDraft<'a> {
    pub renter_id: &'a str,
    pub renter_name: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
}

/// Builds a pending request, pricing it from the listing snapshot.
///
/// ## Errors
/// - `Unauthenticated` when the renter id is blank
/// - `InvalidRange` when end precedes start
/// - `SelfRental` when the renter owns the listing
pub fn build_request(
    id: String,
    subject: &RentalSubject,
    draft: RentalDraft<'_>,
    now: DateTime<Utc>,
) -> CoreResult<RentalRequest> {
    if draft.renter_id.trim().is_empty() {
        return Err(CoreError::Unauthenticated);
    }
    let total = quote_total(subject.daily_rate, draft.start_date, draft.end_date)?;
    if draft.renter_id == subject.owner_id {
        return Err(CoreError::SelfRental);
    }

    Ok(RentalRequest {
        id,
        equipment_id: subject.equipment_id.clone(),
        equipment_name: subject.equipment_name.clone(),
        owner_id: subject.owner_id.clone(),
        owner_name: subject.owner_name.clone(),
        renter_id: draft.renter_id.to_string(),
        renter_name: draft.renter_name.to_string(),
        start_date: draft.start_date,
        end_date: draft.end_date,
        total_price_cents: total.cents(),
        status: RentalStatus::Pending,
        created_at: now,
        notes: draft.notes.filter(|n| !n.trim().is_empty()),
    })
}

/// Text of the notification sent to the owner when a request is made.
///
/// The id is in the text for humans; tooling reads the structured reference.
pub fn request_notice_text(request: &RentalRequest) -> String {
    format!(
        "I've submitted a rental request for your {}. Request ID: {}",
        request.equipment_name, request.id
    )
}

// =============================================================================
// Status Transitions
// =============================================================================

/// Whether the state machine has an edge `from → to`.
pub fn is_valid_transition(from: RentalStatus, to: RentalStatus) -> bool {
    use RentalStatus::*;
    matches!(
        (from, to),
        (Pending, Approved) | (Pending, Rejected) | (Approved, Completed)
    )
}

/// Checks that `requester_id` may move `request` to `to`.
///
/// ## Authority
/// | Edge                  | Who            |
/// |-----------------------|----------------|
/// | pending → approved    | owner          |
/// | pending → rejected    | owner          |
/// | approved → completed  | owner, renter  |
pub fn authorize_transition(
    request: &RentalRequest,
    to: RentalStatus,
    requester_id: &str,
) -> CoreResult<()> {
    if requester_id.trim().is_empty() {
        return Err(CoreError::Unauthenticated);
    }
    if !is_valid_transition(request.status, to) {
        return Err(CoreError::InvalidTransition {
            from: request.status,
            to,
        });
    }

    let is_owner = request.owner_id == requester_id;
    let is_renter = request.renter_id == requester_id;
    let allowed = match to {
        RentalStatus::Approved | RentalStatus::Rejected => is_owner,
        RentalStatus::Completed => is_owner || is_renter,
        RentalStatus::Pending => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(CoreError::Forbidden {
            request_id: request.id.clone(),
            requester: requester_id.to_string(),
            status: to,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn camera() -> RentalSubject {
        RentalSubject {
            equipment_id: "e-1".to_string(),
            equipment_name: "Sony A7III".to_string(),
            owner_id: "owner".to_string(),
            owner_name: "John Doe".to_string(),
            daily_rate: Money::from_cents(7500),
        }
    }

    fn draft(renter: &str, start: NaiveDate, end: NaiveDate) -> RentalDraft<'_> {
        RentalDraft {
            renter_id: renter,
            renter_name: "Jane Smith",
            start_date: start,
            end_date: end,
            notes: None,
        }
    }

    fn request_in(status: RentalStatus) -> RentalRequest {
        let mut r = build_request(
            "r-1".to_string(),
            &camera(),
            draft("renter", date(3, 20), date(3, 22)),
            Utc::now(),
        )
        .unwrap();
        r.status = status;
        r
    }

    #[test]
    fn test_two_day_rental_costs_150() {
        let total = quote_total(Money::from_cents(7500), date(3, 20), date(3, 22)).unwrap();
        assert_eq!(total, Money::from_cents(15000));
    }

    #[test]
    fn test_same_day_is_zero_days() {
        assert_eq!(rental_days(date(3, 20), date(3, 20)).unwrap(), 0);
        let total = quote_total(Money::from_cents(7500), date(3, 20), date(3, 20)).unwrap();
        assert_eq!(total.cents(), 0);
    }

    #[test]
    fn test_days_across_month_boundary() {
        assert_eq!(rental_days(date(2, 28), date(3, 2)).unwrap(), 3);
    }

    #[test]
    fn test_reversed_range_rejected() {
        let err = rental_days(date(3, 22), date(3, 20)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRange { .. }));
    }

    #[test]
    fn test_build_request_is_pending_and_priced() {
        let request = request_in(RentalStatus::Pending);
        assert_eq!(request.status, RentalStatus::Pending);
        assert_eq!(request.total_price_cents, 15000);
        assert_eq!(request.owner_id, "owner");
        assert_eq!(request.equipment_name, "Sony A7III");
    }

    #[test]
    fn test_self_rental_rejected() {
        let err = build_request(
            "r-2".to_string(),
            &camera(),
            draft("owner", date(3, 20), date(3, 22)),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, CoreError::SelfRental);
    }

    #[test]
    fn test_blank_renter_unauthenticated() {
        let err = build_request(
            "r-3".to_string(),
            &camera(),
            draft("", date(3, 20), date(3, 22)),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, CoreError::Unauthenticated);
    }

    #[test]
    fn test_notice_mentions_request_id() {
        let request = request_in(RentalStatus::Pending);
        let text = request_notice_text(&request);
        assert!(text.contains("Sony A7III"));
        assert!(text.ends_with("Request ID: r-1"));
    }

    #[test]
    fn test_owner_approves_and_rejects() {
        let pending = request_in(RentalStatus::Pending);
        assert!(authorize_transition(&pending, RentalStatus::Approved, "owner").is_ok());
        assert!(authorize_transition(&pending, RentalStatus::Rejected, "owner").is_ok());
    }

    #[test]
    fn test_renter_cannot_approve() {
        let pending = request_in(RentalStatus::Pending);
        let err = authorize_transition(&pending, RentalStatus::Approved, "renter").unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { .. }));
    }

    #[test]
    fn test_completion_by_either_party() {
        let approved = request_in(RentalStatus::Approved);
        assert!(authorize_transition(&approved, RentalStatus::Completed, "owner").is_ok());
        assert!(authorize_transition(&approved, RentalStatus::Completed, "renter").is_ok());
        let err = authorize_transition(&approved, RentalStatus::Completed, "stranger").unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { .. }));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for terminal in [RentalStatus::Rejected, RentalStatus::Completed] {
            let request = request_in(terminal);
            for to in [
                RentalStatus::Pending,
                RentalStatus::Approved,
                RentalStatus::Rejected,
                RentalStatus::Completed,
            ] {
                let err = authorize_transition(&request, to, "owner").unwrap_err();
                assert!(matches!(err, CoreError::InvalidTransition { .. }));
            }
        }
    }

    #[test]
    fn test_pending_cannot_skip_to_completed() {
        let pending = request_in(RentalStatus::Pending);
        let err = authorize_transition(&pending, RentalStatus::Completed, "owner").unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidTransition {
                from: RentalStatus::Pending,
                to: RentalStatus::Completed
            }
        );
    }

    proptest! {
        #[test]
        fn prop_total_is_rate_times_days(
            rate in 1i64..1_000_000,
            offset in 0i64..400,
            span in 0i64..60,
        ) {
            let start = date(1, 1) + chrono::Duration::days(offset);
            let end = start + chrono::Duration::days(span);
            let total = quote_total(Money::from_cents(rate), start, end).unwrap();
            prop_assert_eq!(total.cents(), rate * span);
        }
    }
}
