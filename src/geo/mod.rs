pub mod provider;

use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::state::AppState;

static ZIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{5}").expect("valid zip regex"));

/// A validated 5-digit postal code. The only place zip parsing happens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PostalCode(String);

impl PostalCode {
    /// Pulls the first 5-digit run out of a zip field or a free-form
    /// address string ("1200 N Amburn Rd, Texas City, TX 77591" -> 77591).
    pub fn extract(raw: &str) -> Option<Self> {
        ZIP_RE.find(raw).map(|found| Self(found.as_str().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type DistanceKey = (PostalCode, PostalCode);

#[derive(Debug, Clone, Serialize)]
pub struct DistanceCacheEntry {
    pub miles: f64,
    pub duration_minutes: Option<u32>,
    pub hit_count: u64,
    pub last_calculated: DateTime<Utc>,
}

// Road-distance estimates between service-area zips, anchored at the
// Texas City base. Checked in both directions on lookup.
const STATIC_MILES: &[(&str, &[(&str, f64)])] = &[(
    "77591",
    &[
        ("77573", 5.0),
        ("77598", 8.0),
        ("77546", 8.0),
        ("77058", 10.0),
        ("77506", 12.0),
        ("77520", 15.0),
        ("77002", 18.0),
        ("77478", 18.0),
        ("77584", 20.0),
        ("77449", 20.0),
        ("77429", 22.0),
        ("77375", 25.0),
        ("77301", 30.0),
        ("77550", 45.0),
    ],
)];

/// Resolves a road-distance estimate in miles between two zips.
///
/// Returns `f64::INFINITY` when either side has no parseable zip; the caller
/// must treat that as unreachable, never as zero. Resolution order: exact
/// directional cache hit, mapping provider, static table (both directions),
/// configured default for wholly unknown pairs.
pub async fn resolve_distance(
    state: &AppState,
    origin: Option<&str>,
    destination: Option<&str>,
) -> f64 {
    let Some(origin) = origin.and_then(PostalCode::extract) else {
        return f64::INFINITY;
    };
    let Some(destination) = destination.and_then(PostalCode::extract) else {
        return f64::INFINITY;
    };

    if origin == destination {
        return 0.0;
    }

    let key = (origin.clone(), destination.clone());
    if let Some(entry) = state.distance_cache.get(&key) {
        state
            .metrics
            .distance_lookups
            .with_label_values(&["hit"])
            .inc();
        return entry.miles;
    }

    state
        .metrics
        .distance_lookups
        .with_label_values(&["miss"])
        .inc();

    if let Some(provider) = &state.maps {
        if let Some(leg) = provider.zip_distance(&origin, &destination).await {
            cache_store(state, key, leg.miles, Some(leg.duration_minutes));
            return leg.miles;
        }
    }

    match static_estimate(&origin, &destination) {
        Some(miles) => {
            cache_store(state, key, miles, None);
            miles
        }
        None => {
            debug!(
                origin = %origin,
                destination = %destination,
                fallback = state.fallback_default_miles,
                "zip pair unknown; using fallback default"
            );
            state.fallback_default_miles
        }
    }
}

/// Upsert into the distance cache. The hit counter only moves when a
/// write-back lands on a row that already existed.
fn cache_store(state: &AppState, key: DistanceKey, miles: f64, duration_minutes: Option<u32>) {
    state
        .distance_cache
        .entry(key)
        .and_modify(|entry| {
            entry.miles = miles;
            entry.duration_minutes = duration_minutes.or(entry.duration_minutes);
            entry.hit_count += 1;
            entry.last_calculated = Utc::now();
        })
        .or_insert_with(|| DistanceCacheEntry {
            miles,
            duration_minutes,
            hit_count: 0,
            last_calculated: Utc::now(),
        });
}

fn static_estimate(origin: &PostalCode, destination: &PostalCode) -> Option<f64> {
    table_lookup(origin.as_str(), destination.as_str())
        .or_else(|| table_lookup(destination.as_str(), origin.as_str()))
}

fn table_lookup(origin: &str, destination: &str) -> Option<f64> {
    STATIC_MILES
        .iter()
        .find(|(from, _)| *from == origin)
        .and_then(|(_, legs)| {
            legs.iter()
                .find(|(to, _)| *to == destination)
                .map(|(_, miles)| *miles)
        })
}
