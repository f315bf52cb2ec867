use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant-declared closed date. At most one row per (tenant, date); the
/// availability reads treat it exactly like a booked date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlackoutDate {
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BlackoutDate {
    pub fn new(tenant_id: Uuid, date: NaiveDate, reason: Option<String>) -> Self {
        Self {
            tenant_id,
            date,
            reason,
            created_at: Utc::now(),
        }
    }
}
