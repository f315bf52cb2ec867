use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use veranda_shared::pii::Masked;

/// A venue operator on the platform. Every booking, blackout, customer and
/// catalog row hangs off exactly one tenant; nothing is ever read or written
/// without its id in the predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    /// Public widget key presented by the storefront; not an admin secret.
    pub api_key: Masked<String>,
    /// Platform share of each booking, in percent. Snapshotted onto every
    /// booking at creation; changing it here never rewrites history.
    pub commission_percent: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
