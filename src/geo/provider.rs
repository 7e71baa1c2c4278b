use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::AppError;
use crate::geo::PostalCode;

const DISTANCE_MATRIX_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";
const MILES_PER_METER: f64 = 0.000_621_371;

/// Distance-matrix client for the external mapping provider. Optional: the
/// resolver runs without it and leans on the static table instead.
pub struct MapsProvider {
    client: reqwest::Client,
    api_key: String,
}

pub struct RouteLeg {
    pub miles: f64,
    pub duration_minutes: u32,
}

#[derive(Deserialize)]
struct MatrixResponse {
    status: String,
    rows: Vec<MatrixRow>,
}

#[derive(Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<MatrixValue>,
    duration: Option<MatrixValue>,
}

#[derive(Deserialize)]
struct MatrixValue {
    value: f64,
}

impl MapsProvider {
    pub fn new(api_key: String, timeout_secs: u64) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|err| AppError::Internal(format!("failed to build maps client: {err}")))?;

        Ok(Self { client, api_key })
    }

    /// Road distance between two zips. Every failure mode collapses to
    /// `None` so the caller can degrade to the static table.
    pub async fn zip_distance(
        &self,
        origin: &PostalCode,
        destination: &PostalCode,
    ) -> Option<RouteLeg> {
        let response = match self
            .client
            .get(DISTANCE_MATRIX_URL)
            .query(&[
                ("origins", origin.as_str()),
                ("destinations", destination.as_str()),
                ("units", "imperial"),
                ("mode", "driving"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "distance matrix request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "distance matrix returned non-success status");
            return None;
        }

        let payload: MatrixResponse = match response.json().await {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "distance matrix response malformed");
                return None;
            }
        };

        if payload.status != "OK" {
            warn!(status = %payload.status, "distance matrix rejected the request");
            return None;
        }

        let element = payload.rows.first()?.elements.first()?;
        if element.status != "OK" {
            return None;
        }

        let meters = element.distance.as_ref()?.value;
        let seconds = element.duration.as_ref()?.value;

        Some(RouteLeg {
            miles: meters * MILES_PER_METER,
            duration_minutes: (seconds / 60.0).round() as u32,
        })
    }
}
