use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::payout::{
    generate_weekly_payouts, summarize_payouts, PayoutFilter, PayoutGenerationResult,
    PayoutSummary,
};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/payouts/generate", post(generate))
        .route("/payouts", get(list))
}

#[derive(Deserialize, Default)]
pub struct GeneratePayoutsRequest {
    pub reference_date: Option<DateTime<Utc>>,
}

async fn generate(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<GeneratePayoutsRequest>>,
) -> Json<Vec<PayoutGenerationResult>> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let results = generate_weekly_payouts(&state, request.reference_date);
    Json(results)
}

async fn list(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<PayoutFilter>,
) -> Json<Vec<PayoutSummary>> {
    Json(summarize_payouts(&state, filter))
}
