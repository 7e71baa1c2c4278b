use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::batch::auto_dispatch_pending;
use crate::engine::dispatch::{auto_dispatch_booking, DispatchOptions, DispatchResult};
use crate::error::AppError;
use crate::models::assignment::DispatchAssignment;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dispatch/bookings/:id", post(dispatch_booking))
        .route("/dispatch/run", post(dispatch_pending))
        .route("/assignments", get(list_assignments))
}

#[derive(Deserialize, Default)]
pub struct DispatchRequest {
    #[serde(default)]
    pub dry_run: bool,
    pub require_skills: Option<bool>,
}

impl DispatchRequest {
    fn options(&self) -> DispatchOptions {
        DispatchOptions {
            dry_run: self.dry_run,
            require_skills: self.require_skills.unwrap_or(true),
        }
    }
}

async fn dispatch_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Option<Json<DispatchRequest>>,
) -> Result<Json<DispatchResult>, AppError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let result = auto_dispatch_booking(&state, id, request.options()).await?;
    Ok(Json(result))
}

async fn dispatch_pending(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<DispatchRequest>>,
) -> Json<Vec<DispatchResult>> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let results = auto_dispatch_pending(&state, request.options()).await;
    Json(results)
}

async fn list_assignments(State(state): State<Arc<AppState>>) -> Json<Vec<DispatchAssignment>> {
    let assignments = state
        .assignments
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    Json(assignments)
}
