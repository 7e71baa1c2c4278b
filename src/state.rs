use chrono::FixedOffset;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

use crate::config::Config;
use crate::geo::provider::MapsProvider;
use crate::geo::{DistanceCacheEntry, DistanceKey};
use crate::models::assignment::DispatchAssignment;
use crate::models::booking::Booking;
use crate::models::notary::NotaryProfile;
use crate::models::payout::{ContractorPayout, PayoutKey};
use crate::observability::metrics::Metrics;
use crate::payout::SplitPolicy;

pub struct AppState {
    pub bookings: DashMap<Uuid, Booking>,
    pub notaries: DashMap<Uuid, NotaryProfile>,
    pub assignments: DashMap<Uuid, DispatchAssignment>,
    pub distance_cache: DashMap<DistanceKey, DistanceCacheEntry>,
    pub payouts: DashMap<PayoutKey, ContractorPayout>,
    pub assignment_events_tx: broadcast::Sender<DispatchAssignment>,
    pub maps: Option<MapsProvider>,
    pub business_tz: FixedOffset,
    pub fallback_default_miles: f64,
    pub split_policy: SplitPolicy,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let (assignment_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        let maps = config.maps_api_key.as_ref().and_then(|key| {
            match MapsProvider::new(key.clone(), config.maps_timeout_secs) {
                Ok(provider) => Some(provider),
                Err(err) => {
                    warn!(error = %err, "maps provider disabled");
                    None
                }
            }
        });

        let business_tz = FixedOffset::east_opt(config.business_utc_offset_hours * 3600)
            .unwrap_or_else(|| {
                warn!(
                    offset_hours = config.business_utc_offset_hours,
                    "business utc offset out of range; using utc"
                );
                FixedOffset::east_opt(0).expect("zero offset is valid")
            });

        Self {
            bookings: DashMap::new(),
            notaries: DashMap::new(),
            assignments: DashMap::new(),
            distance_cache: DashMap::new(),
            payouts: DashMap::new(),
            assignment_events_tx,
            maps,
            business_tz,
            fallback_default_miles: config.fallback_default_miles,
            split_policy: SplitPolicy {
                base: config.base_split,
                travel: config.travel_split,
                witness: config.witness_split,
            },
            metrics: Metrics::new(),
        }
    }
}
