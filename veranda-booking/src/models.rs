use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use veranda_shared::pii::Masked;

/// Booking lifecycle status.
///
/// PENDING and PAID are the "active" statuses: they hold the event date
/// exclusively. REFUNDED, CANCELED and EXPIRED release it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Paid,
    Refunded,
    Canceled,
    Expired,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Paid => "PAID",
            BookingStatus::Refunded => "REFUNDED",
            BookingStatus::Canceled => "CANCELED",
            BookingStatus::Expired => "EXPIRED",
        }
    }

    /// Whether a booking in this status blocks its event date.
    pub fn holds_date(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Paid)
    }

    /// Legal lifecycle moves. Settlement events drive every transition;
    /// anything outside this table is a provider-side anomaly.
    pub fn can_transition(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Expired) | (Paid, Refunded) | (Paid, Canceled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "PAID" => Ok(BookingStatus::Paid),
            "REFUNDED" => Ok(BookingStatus::Refunded),
            "CANCELED" => Ok(BookingStatus::Canceled),
            "EXPIRED" => Ok(BookingStatus::Expired),
            other => Err(BookingStateError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingStateError {
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("unknown booking status: {0}")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Package,
    AddOn,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Package => "PACKAGE",
            ItemKind::AddOn => "ADD_ON",
        }
    }
}

impl FromStr for ItemKind {
    type Err = BookingStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PACKAGE" => Ok(ItemKind::Package),
            "ADD_ON" => Ok(ItemKind::AddOn),
            other => Err(BookingStateError::UnknownStatus(other.to_string())),
        }
    }
}

/// A priced line persisted with the booking: the package first, then the
/// selected add-ons in the order the customer picked them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingItem {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub kind: ItemKind,
    pub item_id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub position: i32,
}

/// A confirmed reservation of one event date for one tenant.
///
/// Money fields are snapshots taken at creation time: later changes to the
/// tenant's commission rate or catalog prices never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub package_id: Uuid,
    pub event_date: NaiveDate,
    pub customer_id: Uuid,
    pub status: BookingStatus,
    pub total_cents: i64,
    pub platform_fee_cents: i64,
    pub commission_percent: Decimal,
    pub payment_reference: Option<String>,
    pub items: Vec<BookingItem>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Guarded status move; storage code and in-memory fixtures share the
    /// same legality table via this method.
    pub fn transition(&mut self, next: BookingStatus) -> Result<(), BookingStateError> {
        if !self.status.can_transition(next) {
            return Err(BookingStateError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        if next == BookingStatus::Paid && self.confirmed_at.is_none() {
            self.confirmed_at = Some(Utc::now());
        }
        self.status = next;
        Ok(())
    }
}

/// Customer contact details as submitted with a booking request. The email is
/// the upsert key within a tenant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: Masked<String>,
    pub phone: Option<String>,
}

/// A stored customer, scoped to one tenant. The same email under two tenants
/// is two unrelated customers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub email: Masked<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input to the booking engine. `submitted_total_cents` is what the client
/// displayed; the engine recomputes and compares, it never trusts it.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub package_id: Uuid,
    pub event_date: NaiveDate,
    pub customer: CustomerDetails,
    pub add_on_ids: Vec<Uuid>,
    pub submitted_total_cents: i64,
    pub payment_reference: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            package_id: Uuid::new_v4(),
            event_date: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
            customer_id: Uuid::new_v4(),
            status,
            total_cents: 150_000,
            platform_fee_cents: 15_000,
            commission_percent: Decimal::new(10, 0),
            payment_reference: Some("cs_test_123".to_string()),
            items: vec![],
            created_at: Utc::now(),
            confirmed_at: None,
        }
    }

    #[test]
    fn pending_and_paid_hold_the_date() {
        assert!(BookingStatus::Pending.holds_date());
        assert!(BookingStatus::Paid.holds_date());
        assert!(!BookingStatus::Refunded.holds_date());
        assert!(!BookingStatus::Canceled.holds_date());
        assert!(!BookingStatus::Expired.holds_date());
    }

    #[test]
    fn lifecycle_happy_path() {
        let mut b = booking(BookingStatus::Pending);
        b.transition(BookingStatus::Paid).unwrap();
        assert_eq!(b.status, BookingStatus::Paid);
        assert!(b.confirmed_at.is_some());

        b.transition(BookingStatus::Refunded).unwrap();
        assert_eq!(b.status, BookingStatus::Refunded);
    }

    #[test]
    fn pending_can_expire_but_not_refund() {
        let mut b = booking(BookingStatus::Pending);
        assert!(b.transition(BookingStatus::Refunded).is_err());
        b.transition(BookingStatus::Expired).unwrap();
        assert_eq!(b.status, BookingStatus::Expired);
    }

    #[test]
    fn terminal_statuses_accept_nothing() {
        for terminal in [BookingStatus::Refunded, BookingStatus::Canceled, BookingStatus::Expired] {
            let mut b = booking(terminal);
            for next in [
                BookingStatus::Pending,
                BookingStatus::Paid,
                BookingStatus::Refunded,
                BookingStatus::Canceled,
                BookingStatus::Expired,
            ] {
                assert!(b.transition(next).is_err(), "{terminal} -> {next} must be illegal");
            }
        }
    }

    #[test]
    fn confirmation_timestamp_is_written_once() {
        let mut b = booking(BookingStatus::Pending);
        b.transition(BookingStatus::Paid).unwrap();
        let first = b.confirmed_at.unwrap();

        // A later cancel leaves the original confirmation timestamp alone.
        b.transition(BookingStatus::Canceled).unwrap();
        assert_eq!(b.confirmed_at.unwrap(), first);
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Paid,
            BookingStatus::Refunded,
            BookingStatus::Canceled,
            BookingStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("SETTLED".parse::<BookingStatus>().is_err());
    }
}
