use chrono::NaiveDate;
use uuid::Uuid;

/// Published after a booking row is durably committed (status PENDING).
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCreatedEvent {
    pub booking_id: Uuid,
    pub tenant_id: Uuid,
    pub package_id: Uuid,
    pub event_date: NaiveDate,
    pub total_cents: i64,
    pub timestamp: i64,
}

/// Published after a settlement event moves a booking from PENDING to PAID.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub tenant_id: Uuid,
    pub event_date: NaiveDate,
    pub settlement_event_id: String,
    pub timestamp: i64,
}
