use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::booking::{Booking, BookingStatus, WitnessType};
use crate::models::payout::{
    ContractorPayout, EntryMetadata, PayoutEntry, PayoutEntryType, PayoutStatus,
};
use crate::state::AppState;

/// Fraction of each fee component paid to the notary; the rest stays with
/// the business. Urgency fees pass through whole and are not listed here.
#[derive(Debug, Clone)]
pub struct SplitPolicy {
    pub base: Decimal,
    pub travel: Decimal,
    pub witness: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayoutGenerationResult {
    pub notary_id: Uuid,
    pub payout_id: Uuid,
    pub total_amount: Decimal,
    pub booking_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayoutSummary {
    pub payout_id: Uuid,
    pub notary_id: Uuid,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub status: PayoutStatus,
    pub total_amount: Decimal,
    pub entry_count: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PayoutFilter {
    pub notary_id: Option<Uuid>,
    pub status: Option<PayoutStatus>,
}

pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Monday through Sunday of the week before the one containing `reference`,
/// in the business timezone. Payouts always run one week in arrears.
pub fn payout_week(reference: DateTime<Utc>, tz: FixedOffset) -> (NaiveDate, NaiveDate) {
    let local = reference.with_timezone(&tz).date_naive();
    let this_monday = local - Duration::days(i64::from(local.weekday().num_days_from_monday()));
    let start = this_monday - Duration::days(7);
    (start, start + Duration::days(6))
}

/// Generates one payout per notary with completed bookings in the previous
/// week. Safe to re-run: an existing payout for the same notary and week is
/// reset and rebuilt. Each notary is persisted independently; one failure
/// never blocks the rest of the run.
pub fn generate_weekly_payouts(
    state: &AppState,
    reference: Option<DateTime<Utc>>,
) -> Vec<PayoutGenerationResult> {
    let reference = reference.unwrap_or_else(Utc::now);
    let (period_start, period_end) = payout_week(reference, state.business_tz);

    let mut by_notary: BTreeMap<Uuid, Vec<Booking>> = BTreeMap::new();
    for entry in state.bookings.iter() {
        let booking = entry.value();
        if booking.status != BookingStatus::Completed {
            continue;
        }
        let Some(notary_id) = booking.notary_id else {
            continue;
        };
        let Some(scheduled) = booking.scheduled_at else {
            continue;
        };
        let local_day = scheduled.with_timezone(&state.business_tz).date_naive();
        if local_day < period_start || local_day > period_end {
            continue;
        }
        by_notary.entry(notary_id).or_default().push(booking.clone());
    }

    info!(
        period_start = %period_start,
        period_end = %period_end,
        notaries = by_notary.len(),
        "weekly payout run started"
    );

    let mut results = Vec::new();
    for (notary_id, bookings) in by_notary {
        match generate_for_notary(state, notary_id, period_start, period_end, &bookings) {
            Ok(Some(result)) => {
                state.metrics.payouts_generated_total.inc();
                results.push(result);
            }
            Ok(None) => {}
            Err(err) => {
                error!(notary_id = %notary_id, error = %err, "payout generation failed");
            }
        }
    }

    results
}

fn generate_for_notary(
    state: &AppState,
    notary_id: Uuid,
    period_start: NaiveDate,
    period_end: NaiveDate,
    bookings: &[Booking],
) -> Result<Option<PayoutGenerationResult>, AppError> {
    let key = (notary_id, period_start);

    let mut entries = Vec::new();
    for booking in bookings {
        entries.extend(decompose_booking(booking, &state.split_policy));
    }

    if entries.is_empty() {
        // A payout row only exists when it has at least one entry; a stale
        // row from a prior run over since-voided amounts goes away.
        state.payouts.remove(&key);
        return Ok(None);
    }

    let total = round_cents(entries.iter().map(|entry| entry.amount).sum());
    let now = Utc::now();
    let note = format!("Generated {}", now.to_rfc3339());

    let payout_id = match state.payouts.entry(key) {
        Entry::Occupied(mut slot) => {
            let payout = slot.get_mut();
            payout.status = PayoutStatus::Pending;
            payout.period_end = period_end;
            payout.total_amount = total;
            payout.notes = Some(note);
            payout.finalized_at = None;
            payout.entries = entries;
            payout.generated_at = now;
            payout.id
        }
        Entry::Vacant(slot) => {
            let payout = ContractorPayout {
                id: Uuid::new_v4(),
                notary_id,
                period_start,
                period_end,
                status: PayoutStatus::Pending,
                total_amount: total,
                notes: Some(note),
                finalized_at: None,
                entries,
                generated_at: now,
            };
            let id = payout.id;
            slot.insert(payout);
            id
        }
    };

    info!(
        notary_id = %notary_id,
        payout_id = %payout_id,
        total_amount = %total,
        booking_count = bookings.len(),
        "contractor payout generated"
    );

    Ok(Some(PayoutGenerationResult {
        notary_id,
        payout_id,
        total_amount: total,
        booking_count: bookings.len(),
    }))
}

/// Splits one booking's charged amount into payable components. Zero-amount
/// components are dropped; every amount is cent-rounded before storage.
fn decompose_booking(booking: &Booking, splits: &SplitPolicy) -> Vec<PayoutEntry> {
    let metadata = EntryMetadata {
        service_type: Some(booking.service_type),
        urgency: booking.urgency,
    };
    let mut entries = Vec::new();

    let mut push = |entry_type: PayoutEntryType, amount: Decimal, description: String| {
        if amount > Decimal::ZERO {
            entries.push(PayoutEntry {
                id: Uuid::new_v4(),
                booking_id: Some(booking.id),
                entry_type,
                amount,
                description,
                metadata: Some(metadata.clone()),
            });
        }
    };

    let base_amount = (booking.total_amount
        - booking.travel_fee
        - booking.urgency_fee
        - booking.witness_fee)
        .max(Decimal::ZERO);
    push(
        PayoutEntryType::Base,
        round_cents(base_amount * splits.base),
        format!("Base compensation for booking {}", booking.id),
    );

    push(
        PayoutEntryType::TravelShare,
        round_cents(booking.travel_fee * splits.travel),
        format!("Travel fee share for booking {}", booking.id),
    );

    // Urgency fees pass through whole.
    push(
        PayoutEntryType::UrgencyBonus,
        round_cents(booking.urgency_fee),
        format!("Urgency bonus for booking {}", booking.id),
    );

    // Customer-arranged witnesses generate no payout to the notary.
    let witness_payable = booking
        .witness_type
        .is_some_and(|witness| witness != WitnessType::CustomerProvided);
    if witness_payable {
        push(
            PayoutEntryType::WitnessSplit,
            round_cents(booking.witness_fee * splits.witness),
            format!("Witness fee share for booking {}", booking.id),
        );
    }

    entries
}

/// Read-only reporting query over persisted payouts, for dashboards.
pub fn summarize_payouts(state: &AppState, filter: PayoutFilter) -> Vec<PayoutSummary> {
    let mut summaries: Vec<PayoutSummary> = state
        .payouts
        .iter()
        .filter(|entry| {
            let payout = entry.value();
            filter.notary_id.is_none_or(|id| payout.notary_id == id)
                && filter.status.is_none_or(|status| payout.status == status)
        })
        .map(|entry| {
            let payout = entry.value();
            PayoutSummary {
                payout_id: payout.id,
                notary_id: payout.notary_id,
                period_start: payout.period_start,
                period_end: payout.period_end,
                status: payout.status,
                total_amount: payout.total_amount,
                entry_count: payout.entries.len(),
                generated_at: payout.generated_at,
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.period_start
            .cmp(&a.period_start)
            .then(a.notary_id.cmp(&b.notary_id))
    });
    summaries
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, TimeZone, Utc, Weekday};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::{generate_weekly_payouts, payout_week, summarize_payouts, PayoutFilter};
    use crate::config::Config;
    use crate::models::booking::{Booking, BookingStatus, ServiceType, UrgencyTier, WitnessType};
    use crate::models::payout::PayoutEntryType;
    use crate::state::AppState;

    fn dollars(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn completed_booking(
        notary_id: Uuid,
        total: i64,
        travel: i64,
        urgency: i64,
        witness: i64,
        witness_type: Option<WitnessType>,
    ) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            // Wednesday 2026-07-29 at 16:00 UTC (10:00 local).
            scheduled_at: Some(Utc.with_ymd_and_hms(2026, 7, 29, 16, 0, 0).unwrap()),
            address_zip: "77591".to_string(),
            service_type: ServiceType::MobileNotary,
            status: BookingStatus::Completed,
            notary_id: Some(notary_id),
            total_amount: dollars(total),
            travel_fee: dollars(travel),
            urgency_fee: dollars(urgency),
            witness_fee: dollars(witness),
            witness_type,
            urgency: Some(UrgencyTier::Standard),
            created_at: Utc::now(),
        }
    }

    // A reference inside the week after the bookings above.
    fn reference() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn week_window_is_previous_monday_through_sunday() {
        let state = AppState::new(&Config::default());
        let (start, end) = payout_week(reference(), state.business_tz);

        assert_eq!(start.weekday(), Weekday::Mon);
        assert_eq!(end.weekday(), Weekday::Sun);
        assert_eq!(start, chrono::NaiveDate::from_ymd_opt(2026, 7, 27).unwrap());
        assert_eq!(end, chrono::NaiveDate::from_ymd_opt(2026, 8, 2).unwrap());
    }

    #[test]
    fn decomposes_fee_components_with_default_splits() {
        let state = AppState::new(&Config::default());
        let notary_id = Uuid::new_v4();

        // $150 total, $20 travel, $25 urgency, no witness.
        let booking = completed_booking(notary_id, 15000, 2000, 2500, 0, None);
        state.bookings.insert(booking.id, booking);

        let results = generate_weekly_payouts(&state, Some(reference()));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].booking_count, 1);
        // Base (150-20-25)*0.5 = 52.50, travel 20*0.7 = 14.00, urgency 25.00.
        assert_eq!(results[0].total_amount, dollars(9150));

        let payout = state
            .payouts
            .get(&(notary_id, chrono::NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()))
            .unwrap();
        assert_eq!(payout.entries.len(), 3);

        let amount_of = |entry_type: PayoutEntryType| {
            payout
                .entries
                .iter()
                .find(|entry| entry.entry_type == entry_type)
                .map(|entry| entry.amount)
        };
        assert_eq!(amount_of(PayoutEntryType::Base), Some(dollars(5250)));
        assert_eq!(amount_of(PayoutEntryType::TravelShare), Some(dollars(1400)));
        assert_eq!(amount_of(PayoutEntryType::UrgencyBonus), Some(dollars(2500)));
        assert_eq!(amount_of(PayoutEntryType::WitnessSplit), None);
    }

    #[test]
    fn entry_sum_matches_payout_total_to_the_cent() {
        let state = AppState::new(&Config::default());
        let notary_id = Uuid::new_v4();

        for booking in [
            completed_booking(notary_id, 15000, 2000, 2500, 0, None),
            // Odd-cent amounts that exercise rounding.
            completed_booking(notary_id, 10001, 333, 0, 2599, Some(WitnessType::AgencyProvided)),
        ] {
            state.bookings.insert(booking.id, booking);
        }

        let results = generate_weekly_payouts(&state, Some(reference()));
        assert_eq!(results.len(), 1);

        let payout = state
            .payouts
            .get(&(notary_id, chrono::NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()))
            .unwrap();
        let sum: Decimal = payout.entries.iter().map(|entry| entry.amount).sum();
        assert_eq!(sum, payout.total_amount);
        assert_eq!(payout.total_amount, results[0].total_amount);
    }

    #[test]
    fn customer_provided_witness_earns_no_split() {
        let state = AppState::new(&Config::default());
        let notary_id = Uuid::new_v4();

        let booking =
            completed_booking(notary_id, 15000, 0, 0, 5000, Some(WitnessType::CustomerProvided));
        state.bookings.insert(booking.id, booking);

        generate_weekly_payouts(&state, Some(reference()));

        let payout = state
            .payouts
            .get(&(notary_id, chrono::NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()))
            .unwrap();
        assert!(payout
            .entries
            .iter()
            .all(|entry| entry.entry_type != PayoutEntryType::WitnessSplit));
    }

    #[test]
    fn regeneration_is_idempotent() {
        let state = AppState::new(&Config::default());
        let notary_id = Uuid::new_v4();

        let booking = completed_booking(notary_id, 15000, 2000, 2500, 0, None);
        state.bookings.insert(booking.id, booking);

        let first = generate_weekly_payouts(&state, Some(reference()));
        let second = generate_weekly_payouts(&state, Some(reference()));

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].total_amount, second[0].total_amount);
        // The payout row is reused, not duplicated.
        assert_eq!(first[0].payout_id, second[0].payout_id);
        assert_eq!(state.payouts.len(), 1);

        let payout = state
            .payouts
            .get(&(notary_id, chrono::NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()))
            .unwrap();
        assert_eq!(payout.entries.len(), 3);
    }

    #[test]
    fn zero_amount_bookings_produce_no_payout_row() {
        let state = AppState::new(&Config::default());
        let notary_id = Uuid::new_v4();

        let booking = completed_booking(notary_id, 0, 0, 0, 0, None);
        state.bookings.insert(booking.id, booking);

        let results = generate_weekly_payouts(&state, Some(reference()));

        assert!(results.is_empty());
        assert!(state.payouts.is_empty());
    }

    #[test]
    fn bookings_outside_the_window_are_ignored() {
        let state = AppState::new(&Config::default());
        let notary_id = Uuid::new_v4();

        let mut this_week = completed_booking(notary_id, 15000, 0, 0, 0, None);
        // Same week as the reference date, so one week too late.
        this_week.scheduled_at = Some(Utc.with_ymd_and_hms(2026, 8, 4, 16, 0, 0).unwrap());
        state.bookings.insert(this_week.id, this_week);

        let results = generate_weekly_payouts(&state, Some(reference()));
        assert!(results.is_empty());
    }

    #[test]
    fn summary_filters_by_notary() {
        let state = AppState::new(&Config::default());
        let first_notary = Uuid::new_v4();
        let second_notary = Uuid::new_v4();

        for booking in [
            completed_booking(first_notary, 15000, 0, 0, 0, None),
            completed_booking(second_notary, 20000, 0, 0, 0, None),
        ] {
            state.bookings.insert(booking.id, booking);
        }

        generate_weekly_payouts(&state, Some(reference()));

        assert_eq!(summarize_payouts(&state, PayoutFilter::default()).len(), 2);

        let filtered = summarize_payouts(
            &state,
            PayoutFilter {
                notary_id: Some(first_notary),
                status: None,
            },
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].notary_id, first_notary);
        assert_eq!(filtered[0].total_amount, dollars(7500));
    }
}
