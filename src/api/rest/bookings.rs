use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::booking::{Booking, BookingStatus, ServiceType, UrgencyTier, WitnessType};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/:id", get(get_booking))
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub address_zip: String,
    pub service_type: ServiceType,
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub travel_fee: Decimal,
    #[serde(default)]
    pub urgency_fee: Decimal,
    #[serde(default)]
    pub witness_fee: Decimal,
    pub witness_type: Option<WitnessType>,
    pub urgency: Option<UrgencyTier>,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    if payload.address_zip.trim().is_empty() {
        return Err(AppError::BadRequest("address_zip cannot be empty".to_string()));
    }

    let booking = Booking {
        id: Uuid::new_v4(),
        scheduled_at: payload.scheduled_at,
        address_zip: payload.address_zip,
        service_type: payload.service_type,
        status: payload.status.unwrap_or(BookingStatus::PendingConfirmation),
        notary_id: None,
        total_amount: payload.total_amount,
        travel_fee: payload.travel_fee,
        urgency_fee: payload.urgency_fee,
        witness_fee: payload.witness_fee,
        witness_type: payload.witness_type,
        urgency: payload.urgency,
        created_at: Utc::now(),
    };

    state.bookings.insert(booking.id, booking.clone());
    Ok(Json(booking))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", id)))?;

    Ok(Json(booking.value().clone()))
}
