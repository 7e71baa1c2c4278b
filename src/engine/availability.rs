use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::state::AppState;

/// An existing booking within this many minutes of the target time excludes
/// a notary from candidacy outright.
pub const CONFLICT_BUFFER_MINUTES: i64 = 90;

#[derive(Debug, Clone, Copy)]
pub struct DayWorkload {
    pub count: u32,
    pub has_conflict: bool,
}

/// Counts a notary's commitments on the target's local calendar day and
/// flags any that sit inside the conflict buffer around the target time.
/// Cancelled and archived bookings are ignored.
pub fn workload_for_day(state: &AppState, notary_id: Uuid, target: DateTime<Utc>) -> DayWorkload {
    let target_day = target.with_timezone(&state.business_tz).date_naive();

    let mut count = 0u32;
    let mut has_conflict = false;

    for entry in state.bookings.iter() {
        let booking = entry.value();
        if booking.notary_id != Some(notary_id) || !booking.status.counts_toward_workload() {
            continue;
        }
        let Some(scheduled) = booking.scheduled_at else {
            continue;
        };
        if scheduled.with_timezone(&state.business_tz).date_naive() != target_day {
            continue;
        }

        count += 1;
        if (scheduled - target).num_minutes().abs() < CONFLICT_BUFFER_MINUTES {
            has_conflict = true;
        }
    }

    DayWorkload { count, has_conflict }
}
