use chrono::{DateTime, Utc};
use tracing::{error, info};
use uuid::Uuid;

use crate::engine::dispatch::{auto_dispatch_booking, DispatchOptions, DispatchResult, SkipReason};
use crate::models::booking::BookingStatus;
use crate::state::AppState;

/// Dispatches every unassigned, future, active booking, earliest first.
/// Strictly sequential: each decision must see the workload effects of the
/// assignments made before it in the same run. One booking's failure never
/// aborts the rest.
pub async fn auto_dispatch_pending(state: &AppState, options: DispatchOptions) -> Vec<DispatchResult> {
    let now = Utc::now();

    let mut eligible: Vec<(DateTime<Utc>, Uuid)> = state
        .bookings
        .iter()
        .filter_map(|entry| {
            let booking = entry.value();
            if booking.notary_id.is_some() {
                return None;
            }
            let scheduled = booking.scheduled_at?;
            if scheduled < now {
                return None;
            }
            let dispatchable = matches!(
                booking.status,
                BookingStatus::Confirmed | BookingStatus::Scheduled | BookingStatus::PaymentPending
            );
            dispatchable.then_some((scheduled, booking.id))
        })
        .collect();

    eligible.sort_by_key(|(scheduled, _)| *scheduled);

    info!(pending = eligible.len(), "dispatch batch started");

    let mut results = Vec::with_capacity(eligible.len());
    for (_, booking_id) in eligible {
        match auto_dispatch_booking(state, booking_id, options).await {
            Ok(result) => results.push(result),
            Err(err) => {
                error!(booking_id = %booking_id, error = %err, "auto-dispatch failed");
                results.push(DispatchResult::skipped(booking_id, SkipReason::DispatchFailed));
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::auto_dispatch_pending;
    use crate::config::Config;
    use crate::engine::dispatch::{DispatchOptions, SkipReason};
    use crate::models::booking::{Booking, BookingStatus, ServiceType};
    use crate::models::notary::{NotaryProfile, Role};
    use crate::state::AppState;

    /// 09:00 local, two days out: far enough in the future to be eligible,
    /// pinned to one local calendar day so offsets stay within it.
    fn morning_base(state: &AppState) -> DateTime<Utc> {
        let local_day = (Utc::now() + Duration::days(2))
            .with_timezone(&state.business_tz)
            .date_naive();
        local_day
            .and_hms_opt(9, 0, 0)
            .unwrap()
            .and_local_timezone(state.business_tz)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn booking_at(scheduled_at: DateTime<Utc>) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            scheduled_at: Some(scheduled_at),
            address_zip: "77591".to_string(),
            service_type: ServiceType::StandardNotary,
            status: BookingStatus::Confirmed,
            notary_id: None,
            total_amount: Decimal::new(10000, 2),
            travel_fee: Decimal::ZERO,
            urgency_fee: Decimal::ZERO,
            witness_fee: Decimal::ZERO,
            witness_type: None,
            urgency: None,
            created_at: Utc::now(),
        }
    }

    fn sole_notary() -> NotaryProfile {
        NotaryProfile {
            id: Uuid::new_v4(),
            name: "Only Notary".to_string(),
            email: "only@example.com".to_string(),
            role: Role::Notary,
            is_active: true,
            base_zip: Some("77591".to_string()),
            base_address: None,
            service_radius_miles: Some(25.0),
            daily_capacity: 2,
            skills: Vec::new(),
            preferred_zips: Vec::new(),
            preferred_start_hour: None,
            preferred_end_hour: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn sequential_runs_observe_earlier_assignments() {
        let state = AppState::new(&Config::default());
        let profile = sole_notary();
        state.notaries.insert(profile.id, profile);

        // Bookings at 9:00, 9:30, and 10:00 with one qualified notary. The
        // first gets assigned; the others land inside its conflict buffer.
        let base = morning_base(&state);
        let first = booking_at(base);
        let second = booking_at(base + Duration::minutes(30));
        let third = booking_at(base + Duration::minutes(60));
        let first_id = first.id;
        for booking in [first, second, third] {
            state.bookings.insert(booking.id, booking);
        }

        let results = auto_dispatch_pending(&state, DispatchOptions::default()).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].booking_id, first_id);
        assert!(results[0].assigned);
        assert!(!results[1].assigned);
        assert_eq!(results[1].reason, Some(SkipReason::NoCandidate));
        assert!(!results[2].assigned);
        assert_eq!(results[2].reason, Some(SkipReason::NoCandidate));
        assert_eq!(state.assignments.len(), 1);
    }

    #[tokio::test]
    async fn past_assigned_and_inactive_status_bookings_are_not_considered() {
        let state = AppState::new(&Config::default());
        let profile = sole_notary();
        state.notaries.insert(profile.id, profile);

        let base = morning_base(&state);
        let past = booking_at(Utc::now() - Duration::hours(2));
        let mut taken = booking_at(base);
        taken.notary_id = Some(Uuid::new_v4());
        let mut completed = booking_at(base + Duration::hours(4));
        completed.status = BookingStatus::Completed;

        for booking in [past, taken, completed] {
            state.bookings.insert(booking.id, booking);
        }

        let results = auto_dispatch_pending(&state, DispatchOptions::default()).await;
        assert!(results.is_empty());
    }
}
