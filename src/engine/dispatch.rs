use std::time::Instant;

use chrono::{Timelike, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::{availability, scoring};
use crate::error::AppError;
use crate::geo::{self, PostalCode};
use crate::models::assignment::DispatchAssignment;
use crate::models::booking::{Booking, BookingStatus, ServiceType};
use crate::models::notary::{NotaryProfile, Role, Skill};
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    pub dry_run: bool,
    pub require_skills: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            require_skills: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    NotFound,
    AlreadyAssigned,
    MissingTime,
    NoCandidate,
    DispatchFailed,
}

/// A notary under evaluation for one booking. Transient: only the winner's
/// id and score survive, on the assignment record.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchCandidate {
    pub notary_id: Uuid,
    pub name: String,
    pub email: String,
    pub distance_miles: f64,
    pub assignments_today: u32,
    pub score: f64,
    pub same_zip: bool,
    pub preferred_zip_match: bool,
    pub availability_penalty: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub booking_id: Uuid,
    pub assigned: bool,
    pub dry_run: bool,
    pub reason: Option<SkipReason>,
    pub candidate: Option<DispatchCandidate>,
}

impl DispatchResult {
    pub fn skipped(booking_id: Uuid, reason: SkipReason) -> Self {
        Self {
            booking_id,
            assigned: false,
            dry_run: false,
            reason: Some(reason),
            candidate: None,
        }
    }
}

/// Skill tags a booking's service category demands of its notary.
pub fn required_skills(service_type: ServiceType) -> Vec<Skill> {
    match service_type {
        ServiceType::LoanSigning => vec![Skill::LoanSigning],
        ServiceType::RemoteOnlineNotarization => vec![Skill::Ron],
        ServiceType::ExtendedHours => vec![Skill::ExtendedHours],
        ServiceType::SpecialtyNotary => vec![Skill::SpecialtyNotary],
        _ => Vec::new(),
    }
}

fn matches_skills(candidate: &[Skill], required: &[Skill], require_skills: bool) -> bool {
    if required.is_empty() {
        return true;
    }
    if candidate.is_empty() {
        // An empty skill list reads as "unspecified": allowed only when
        // skill enforcement is relaxed.
        return !require_skills;
    }
    required.iter().all(|skill| candidate.contains(skill))
}

/// Single-booking dispatch entry point. Expected no-op outcomes (missing
/// booking, already assigned, no time, no candidate) come back as typed
/// results; errors are reserved for commit failures.
pub async fn auto_dispatch_booking(
    state: &AppState,
    booking_id: Uuid,
    options: DispatchOptions,
) -> Result<DispatchResult, AppError> {
    let start = Instant::now();
    let result = dispatch_booking(state, booking_id, options).await;

    let outcome = match &result {
        Ok(outcome) if outcome.assigned => "assigned",
        Ok(outcome) if outcome.dry_run => "dry_run",
        Ok(outcome) => match outcome.reason {
            Some(SkipReason::NoCandidate) => "no_candidate",
            _ => "skipped",
        },
        Err(_) => "error",
    };

    state
        .metrics
        .dispatch_latency_seconds
        .with_label_values(&[outcome])
        .observe(start.elapsed().as_secs_f64());
    state
        .metrics
        .dispatch_total
        .with_label_values(&[outcome])
        .inc();

    result
}

async fn dispatch_booking(
    state: &AppState,
    booking_id: Uuid,
    options: DispatchOptions,
) -> Result<DispatchResult, AppError> {
    let Some(booking) = state
        .bookings
        .get(&booking_id)
        .map(|entry| entry.value().clone())
    else {
        warn!(booking_id = %booking_id, "dispatch skipped: booking not found");
        return Ok(DispatchResult::skipped(booking_id, SkipReason::NotFound));
    };

    if let Some(notary_id) = booking.notary_id {
        info!(
            booking_id = %booking_id,
            notary_id = %notary_id,
            "dispatch skipped: booking already assigned"
        );
        return Ok(DispatchResult::skipped(booking_id, SkipReason::AlreadyAssigned));
    }

    if booking.scheduled_at.is_none() {
        warn!(booking_id = %booking_id, "dispatch skipped: missing scheduled time");
        return Ok(DispatchResult::skipped(booking_id, SkipReason::MissingTime));
    }

    let candidates = build_candidates(state, &booking, options).await;

    let Some(top) = candidates.into_iter().next() else {
        warn!(
            booking_id = %booking_id,
            service_type = ?booking.service_type,
            address_zip = %booking.address_zip,
            "dispatch pending: no qualified notary"
        );
        return Ok(DispatchResult::skipped(booking_id, SkipReason::NoCandidate));
    };

    if options.dry_run {
        return Ok(DispatchResult {
            booking_id,
            assigned: false,
            dry_run: true,
            reason: None,
            candidate: Some(top),
        });
    }

    commit_assignment(state, booking_id, &top)?;

    info!(
        booking_id = %booking_id,
        notary_id = %top.notary_id,
        score = top.score,
        distance_miles = top.distance_miles,
        preferred_zip_match = top.preferred_zip_match,
        availability_penalty = top.availability_penalty,
        "booking auto-dispatched"
    );

    Ok(DispatchResult {
        booking_id,
        assigned: true,
        dry_run: false,
        reason: None,
        candidate: Some(top),
    })
}

async fn build_candidates(
    state: &AppState,
    booking: &Booking,
    options: DispatchOptions,
) -> Vec<DispatchCandidate> {
    let Some(scheduled_at) = booking.scheduled_at else {
        return Vec::new();
    };

    let booking_zip = PostalCode::extract(&booking.address_zip);
    let required = required_skills(booking.service_type);
    let scheduled_hour = scheduled_at.with_timezone(&state.business_tz).hour();

    let profiles: Vec<NotaryProfile> = state
        .notaries
        .iter()
        .filter(|entry| {
            let profile = entry.value();
            profile.is_active && profile.role == Role::Notary
        })
        .map(|entry| entry.value().clone())
        .collect();

    let mut candidates = Vec::new();

    for profile in profiles {
        // Never hand a booking back to the notary it was unassigned from.
        if booking.notary_id == Some(profile.id) {
            continue;
        }

        if !matches_skills(&profile.skills, &required, options.require_skills) {
            continue;
        }

        let base_zip_source = profile
            .base_zip
            .as_deref()
            .or(profile.base_address.as_deref());

        let distance_miles =
            geo::resolve_distance(state, base_zip_source, Some(booking.address_zip.as_str())).await;
        if !distance_miles.is_finite() {
            continue;
        }

        if let Some(radius) = profile.service_radius_miles {
            if distance_miles > radius {
                continue;
            }
        }

        let workload = availability::workload_for_day(state, profile.id, scheduled_at);
        if workload.has_conflict {
            continue;
        }

        let base_zip = base_zip_source.and_then(PostalCode::extract);
        let preferred: Vec<PostalCode> = profile
            .preferred_zips
            .iter()
            .filter_map(|zip| PostalCode::extract(zip))
            .collect();
        let preferred_list_defined = !preferred.is_empty();
        let preferred_zip_hit =
            matches!(&booking_zip, Some(zip) if preferred.contains(zip));
        let same_zip =
            matches!((&base_zip, &booking_zip), (Some(base), Some(target)) if base == target);

        let availability_penalty = scoring::availability_penalty(
            Some(scheduled_hour),
            profile.preferred_start_hour,
            profile.preferred_end_hour,
        );
        let score = scoring::candidate_score(
            distance_miles,
            workload.count,
            profile.daily_capacity,
            same_zip,
            preferred_zip_hit,
            availability_penalty,
            preferred_list_defined,
        );

        candidates.push(DispatchCandidate {
            notary_id: profile.id,
            name: profile.name,
            email: profile.email,
            distance_miles,
            assignments_today: workload.count,
            score,
            same_zip,
            preferred_zip_match: preferred_zip_hit,
            availability_penalty,
        });
    }

    // Stable sort: equal scores keep enumeration order.
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates
}

/// Commits the winning candidate. The booking's entry guard is held across
/// the re-check, the mutation, and the audit insert, so the write is
/// all-or-nothing and doubles as the per-booking lock against concurrent
/// dispatch runs.
fn commit_assignment(
    state: &AppState,
    booking_id: Uuid,
    winner: &DispatchCandidate,
) -> Result<(), AppError> {
    let now = Utc::now();
    let assignment = DispatchAssignment {
        id: Uuid::new_v4(),
        booking_id,
        notary_id: winner.notary_id,
        score: winner.score,
        note: format!("Auto-dispatch {}", now.to_rfc3339()),
        created_at: now,
    };

    {
        let mut booking = state.bookings.get_mut(&booking_id).ok_or_else(|| {
            AppError::NotFound(format!("booking {booking_id} disappeared during dispatch"))
        })?;

        // Optimistic guard: a concurrent run may have assigned between
        // candidate scoring and this write.
        if booking.notary_id.is_some() {
            return Err(AppError::Conflict(format!(
                "booking {booking_id} was assigned concurrently"
            )));
        }

        booking.notary_id = Some(winner.notary_id);
        if booking.status == BookingStatus::Confirmed {
            booking.status = BookingStatus::Scheduled;
        }

        state.assignments.insert(assignment.id, assignment.clone());
    }

    let _ = state.assignment_events_tx.send(assignment);
    Ok(())
}
