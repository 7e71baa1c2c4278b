pub const DEFAULT_START_HOUR: u32 = 7;
pub const DEFAULT_END_HOUR: u32 = 21;

// Distance beyond the cap stops hurting: extreme outliers should already
// have been excluded by the radius filter.
const DISTANCE_PENALTY_CAP: f64 = 60.0;
const LOAD_PENALTY_WEIGHT: f64 = 25.0;
const SAME_ZIP_BONUS: f64 = 10.0;
const PREFERRED_ZIP_BONUS: f64 = 15.0;
const PREFERRED_ZIP_MISS_PENALTY: f64 = 10.0;
const AVAILABILITY_PENALTY_CAP: f64 = 60.0;
const HOURS_OUTSIDE_WEIGHT: f64 = 10.0;
const WINDOW_PENALTY_CAP: f64 = 50.0;

/// Fitness score for a (booking, notary) pair. Deterministic; higher wins.
/// Ties are broken by the caller's stable descending sort, i.e. first-seen.
pub fn candidate_score(
    distance_miles: f64,
    assignments_today: u32,
    daily_capacity: u32,
    same_zip: bool,
    preferred_zip_hit: bool,
    availability_penalty: f64,
    preferred_list_defined: bool,
) -> f64 {
    let distance_penalty = distance_miles.min(DISTANCE_PENALTY_CAP);
    let load_ratio = if daily_capacity > 0 {
        f64::from(assignments_today) / f64::from(daily_capacity)
    } else {
        0.0
    };
    let load_penalty = load_ratio * LOAD_PENALTY_WEIGHT;

    let mut score = 100.0 - distance_penalty - load_penalty;
    if same_zip {
        score += SAME_ZIP_BONUS;
    }
    if preferred_zip_hit {
        score += PREFERRED_ZIP_BONUS;
    }
    // Notaries with no preference list are not penalized.
    if !preferred_zip_hit && preferred_list_defined {
        score -= PREFERRED_ZIP_MISS_PENALTY;
    }

    score - availability_penalty.min(AVAILABILITY_PENALTY_CAP)
}

/// Linear penalty for a booking hour outside the notary's preferred
/// `[start, end)` window. The window may wrap midnight (e.g. 20 -> 4).
/// A booking with no concrete hour carries no penalty.
pub fn availability_penalty(
    scheduled_hour: Option<u32>,
    start_hour: Option<u32>,
    end_hour: Option<u32>,
) -> f64 {
    let Some(hour) = scheduled_hour else {
        return 0.0;
    };
    let start = start_hour.unwrap_or(DEFAULT_START_HOUR) % 24;
    let end = end_hour.unwrap_or(DEFAULT_END_HOUR) % 24;

    if start < end {
        if hour >= start && hour < end {
            return 0.0;
        }
        let hours_outside = if hour < start { start - hour } else { hour - end };
        return (f64::from(hours_outside) * HOURS_OUTSIDE_WEIGHT).min(WINDOW_PENALTY_CAP);
    }

    // Overnight window.
    if hour >= start || hour < end {
        return 0.0;
    }
    let hours_outside = if hour < start { start - hour } else { hour - end };
    (f64::from(hours_outside) * HOURS_OUTSIDE_WEIGHT).min(WINDOW_PENALTY_CAP)
}
