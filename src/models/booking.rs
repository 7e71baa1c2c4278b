use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    PendingConfirmation,
    PaymentPending,
    Confirmed,
    Scheduled,
    InProgress,
    Completed,
    CancelledByClient,
    CancelledByStaff,
    Archived,
}

impl BookingStatus {
    /// Cancelled and archived bookings never count toward a notary's day.
    pub fn counts_toward_workload(self) -> bool {
        !matches!(
            self,
            BookingStatus::CancelledByClient
                | BookingStatus::CancelledByStaff
                | BookingStatus::Archived
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceType {
    StandardNotary,
    MobileNotary,
    RealEstateNotary,
    EmergencyNotary,
    ExtendedHours,
    LoanSigning,
    SpecialtyNotary,
    RemoteOnlineNotarization,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UrgencyTier {
    Standard,
    Priority,
    Emergency,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WitnessType {
    CustomerProvided,
    AgencyProvided,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub address_zip: String,
    pub service_type: ServiceType,
    pub status: BookingStatus,
    pub notary_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub travel_fee: Decimal,
    pub urgency_fee: Decimal,
    pub witness_fee: Decimal,
    pub witness_type: Option<WitnessType>,
    pub urgency: Option<UrgencyTier>,
    pub created_at: DateTime<Utc>,
}
