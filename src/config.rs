use std::env;

use rust_decimal::Decimal;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    /// Offset of the business timezone from UTC, in hours. All hour-of-day,
    /// same-day, and payout-week math runs in this timezone.
    pub business_utc_offset_hours: i32,
    pub maps_api_key: Option<String>,
    pub maps_timeout_secs: u64,
    /// Distance assumed when a zip pair is in neither the cache nor the
    /// static table. Conservative on purpose: far enough that the radius
    /// filter rejects the candidate instead of silently matching it as near.
    pub fallback_default_miles: f64,
    pub base_split: Decimal,
    pub travel_split: Decimal,
    pub witness_split: Decimal,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            business_utc_offset_hours: parse_or_default("BUSINESS_UTC_OFFSET_HOURS", -6)?,
            maps_api_key: env::var("GOOGLE_MAPS_API_KEY").ok().filter(|key| !key.is_empty()),
            maps_timeout_secs: parse_or_default("MAPS_TIMEOUT_SECS", 10)?,
            fallback_default_miles: parse_or_default("FALLBACK_DEFAULT_MILES", 60.0)?,
            base_split: parse_or_default("PAYOUT_BASE_SPLIT", Decimal::new(50, 2))?,
            travel_split: parse_or_default("PAYOUT_TRAVEL_SPLIT", Decimal::new(70, 2))?,
            witness_split: parse_or_default("PAYOUT_WITNESS_SPLIT", Decimal::new(50, 2))?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            event_buffer_size: 1024,
            business_utc_offset_hours: -6,
            maps_api_key: None,
            maps_timeout_secs: 10,
            fallback_default_miles: 60.0,
            base_split: Decimal::new(50, 2),
            travel_split: Decimal::new(70, 2),
            witness_split: Decimal::new(50, 2),
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
