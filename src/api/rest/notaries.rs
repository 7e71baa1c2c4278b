use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::notary::{NotaryProfile, Role, Skill, DEFAULT_DAILY_CAPACITY};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/notaries", post(create_notary).get(list_notaries))
        .route("/notaries/:id/status", patch(update_notary_status))
}

#[derive(Deserialize)]
pub struct CreateNotaryRequest {
    pub name: String,
    pub email: String,
    pub base_zip: Option<String>,
    pub base_address: Option<String>,
    pub service_radius_miles: Option<f64>,
    pub daily_capacity: Option<u32>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub preferred_zips: Vec<String>,
    pub preferred_start_hour: Option<u32>,
    pub preferred_end_hour: Option<u32>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub is_active: bool,
}

async fn create_notary(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateNotaryRequest>,
) -> Result<Json<NotaryProfile>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if payload.base_zip.is_none() && payload.base_address.is_none() {
        return Err(AppError::BadRequest(
            "either base_zip or base_address is required".to_string(),
        ));
    }

    for hour in [payload.preferred_start_hour, payload.preferred_end_hour]
        .into_iter()
        .flatten()
    {
        if hour > 23 {
            return Err(AppError::BadRequest(format!("invalid hour {hour}")));
        }
    }

    let profile = NotaryProfile {
        id: Uuid::new_v4(),
        name: payload.name,
        email: payload.email,
        role: Role::Notary,
        is_active: true,
        base_zip: payload.base_zip,
        base_address: payload.base_address,
        service_radius_miles: payload.service_radius_miles,
        daily_capacity: payload.daily_capacity.unwrap_or(DEFAULT_DAILY_CAPACITY),
        skills: payload.skills,
        preferred_zips: payload.preferred_zips,
        preferred_start_hour: payload.preferred_start_hour,
        preferred_end_hour: payload.preferred_end_hour,
        updated_at: Utc::now(),
    };

    state.notaries.insert(profile.id, profile.clone());
    Ok(Json(profile))
}

async fn list_notaries(State(state): State<Arc<AppState>>) -> Json<Vec<NotaryProfile>> {
    let notaries = state
        .notaries
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(notaries)
}

async fn update_notary_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<NotaryProfile>, AppError> {
    let mut profile = state
        .notaries
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("notary {} not found", id)))?;

    profile.is_active = payload.is_active;
    profile.updated_at = Utc::now();

    Ok(Json(profile.clone()))
}
