use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only record of an automatic dispatch decision. One row per
/// successful assignment; never updated or deleted, so the audit trail
/// survives later manual reassignment of the booking itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchAssignment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub notary_id: Uuid,
    pub score: f64,
    pub note: String,
    pub created_at: DateTime<Utc>,
}
