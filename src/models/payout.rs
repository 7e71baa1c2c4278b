use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::booking::{ServiceType, UrgencyTier};

/// Natural key of a payout: one per notary per payout week.
pub type PayoutKey = (Uuid, NaiveDate);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PayoutStatus {
    Pending,
    Approved,
    Paid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PayoutEntryType {
    Base,
    TravelShare,
    UrgencyBonus,
    WitnessSplit,
    Adjustment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub service_type: Option<ServiceType>,
    pub urgency: Option<UrgencyTier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutEntry {
    pub id: Uuid,
    /// None for manual adjustments.
    pub booking_id: Option<Uuid>,
    pub entry_type: PayoutEntryType,
    pub amount: Decimal,
    pub description: String,
    pub metadata: Option<EntryMetadata>,
}

/// Weekly compensation aggregate for one notary. Regeneration keeps the id,
/// resets status to pending, and rebuilds the entries from scratch.
/// Invariant: `total_amount` equals the sum of `entries` to the cent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractorPayout {
    pub id: Uuid,
    pub notary_id: Uuid,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub status: PayoutStatus,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub entries: Vec<PayoutEntry>,
    pub generated_at: DateTime<Utc>,
}
