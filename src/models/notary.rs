use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_DAILY_CAPACITY: u32 = 8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Client,
    Notary,
    Admin,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Skill {
    LoanSigning,
    Ron,
    ExtendedHours,
    SpecialtyNotary,
}

/// A field notary's dispatch profile. Maintained by the profile-management
/// flow; the dispatch engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotaryProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub base_zip: Option<String>,
    pub base_address: Option<String>,
    pub service_radius_miles: Option<f64>,
    pub daily_capacity: u32,
    pub skills: Vec<Skill>,
    /// Zip codes this notary favors. A bonus/penalty signal for scoring,
    /// never a hard filter.
    pub preferred_zips: Vec<String>,
    pub preferred_start_hour: Option<u32>,
    pub preferred_end_hour: Option<u32>,
    pub updated_at: DateTime<Utc>,
}
