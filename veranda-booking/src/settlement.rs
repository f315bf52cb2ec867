use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::BookingStatus;

/// Settlement event types this core understands. Everything else a provider
/// emits is rejected into the ledger rather than silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementEventKind {
    CheckoutCompleted,
    CheckoutExpired,
    ChargeRefunded,
    PaymentCanceled,
}

impl SettlementEventKind {
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type {
            "checkout.completed" => Some(Self::CheckoutCompleted),
            "checkout.expired" => Some(Self::CheckoutExpired),
            "charge.refunded" => Some(Self::ChargeRefunded),
            "payment.canceled" => Some(Self::PaymentCanceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutCompleted => "checkout.completed",
            Self::CheckoutExpired => "checkout.expired",
            Self::ChargeRefunded => "charge.refunded",
            Self::PaymentCanceled => "payment.canceled",
        }
    }
}

impl fmt::Display for SettlementEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger status of a received settlement event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementEventStatus {
    Pending,
    Processed,
    Failed,
}

impl SettlementEventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processed => "PROCESSED",
            Self::Failed => "FAILED",
        }
    }
}

impl FromStr for SettlementEventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PROCESSED" => Ok(Self::Processed),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown settlement event status: {other}")),
        }
    }
}

/// Raw delivery as it arrives from the payment provider, after whatever
/// signature verification the edge applies. `event_id` is the provider's
/// delivery-independent identifier and is the dedup key.
#[derive(Debug, Clone, Deserialize)]
pub struct SettlementEnvelope {
    pub event_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// The fields this core needs out of a settlement payload. The booking is
/// located by (tenant_id, payment_reference), never by a bare booking id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementPayload {
    pub tenant_id: Uuid,
    pub payment_reference: String,
    #[serde(default)]
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl SettlementPayload {
    pub fn parse(raw: &serde_json::Value) -> Result<Self, PayloadError> {
        Ok(serde_json::from_value(raw.clone())?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("malformed settlement payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// What processing an event did. `Duplicate` means the event id was seen
/// before and nothing was touched; `Applied` with no transition means the
/// booking was already in the target state (cross-event idempotency).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    Applied { transition: Option<AppliedTransition> },
    Duplicate,
    Rejected { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTransition {
    pub booking_id: Uuid,
    pub tenant_id: Uuid,
    pub event_date: NaiveDate,
    pub to: BookingStatus,
}

/// Decision produced by [`disposition`]; the storage layer executes it
/// inside one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementAction {
    Transition { to: BookingStatus, set_confirmed: bool },
    AlreadySettled,
    Reject { reason: String },
}

/// Pure settlement state machine: given the event kind and the booking as it
/// stands, decide what must happen. Amounts, when the payload carries one,
/// must equal the booking's stored total; a divergent charge is never
/// absorbed silently.
pub fn disposition(
    kind: SettlementEventKind,
    current: BookingStatus,
    booking_total_cents: i64,
    payload_amount_cents: Option<i64>,
) -> SettlementAction {
    use BookingStatus::*;
    use SettlementEventKind::*;

    if kind == CheckoutCompleted {
        if let Some(amount) = payload_amount_cents {
            if amount != booking_total_cents {
                return SettlementAction::Reject {
                    reason: format!(
                        "amount mismatch: event carries {amount} but booking total is {booking_total_cents}"
                    ),
                };
            }
        }
    }

    match (kind, current) {
        (CheckoutCompleted, Pending) => SettlementAction::Transition {
            to: Paid,
            set_confirmed: true,
        },
        (CheckoutCompleted, Paid) => SettlementAction::AlreadySettled,
        (CheckoutExpired, Pending) => SettlementAction::Transition {
            to: Expired,
            set_confirmed: false,
        },
        (CheckoutExpired, Expired) => SettlementAction::AlreadySettled,
        (ChargeRefunded, Paid) => SettlementAction::Transition {
            to: Refunded,
            set_confirmed: false,
        },
        (ChargeRefunded, Refunded) => SettlementAction::AlreadySettled,
        (PaymentCanceled, Paid) => SettlementAction::Transition {
            to: Canceled,
            set_confirmed: false,
        },
        (PaymentCanceled, Canceled) => SettlementAction::AlreadySettled,
        (kind, current) => SettlementAction::Reject {
            reason: format!("event {kind} cannot apply to a booking in status {current}"),
        },
    }
}

/// Ledger row as surfaced to operators.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementEventRecord {
    pub event_id: String,
    pub event_type: String,
    pub status: SettlementEventStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub tenant_id: Option<Uuid>,
    pub payment_reference: Option<String>,
    pub payload: serde_json::Value,
    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_event_types_parse() {
        assert_eq!(
            SettlementEventKind::from_event_type("checkout.completed"),
            Some(SettlementEventKind::CheckoutCompleted)
        );
        assert_eq!(
            SettlementEventKind::from_event_type("charge.refunded"),
            Some(SettlementEventKind::ChargeRefunded)
        );
        assert_eq!(SettlementEventKind::from_event_type("invoice.created"), None);
    }

    #[test]
    fn payload_parse_requires_tenant_and_reference() {
        let ok = SettlementPayload::parse(&json!({
            "tenant_id": "a81c6f50-7c51-4d52-b449-2b81ec2aa3b1",
            "payment_reference": "cs_123",
            "amount_cents": 150000
        }));
        assert!(ok.is_ok());

        let missing = SettlementPayload::parse(&json!({ "payment_reference": "cs_123" }));
        assert!(missing.is_err());

        let wrong_type = SettlementPayload::parse(&json!({
            "tenant_id": "not-a-uuid",
            "payment_reference": "cs_123"
        }));
        assert!(wrong_type.is_err());
    }

    #[test]
    fn confirm_on_pending_transitions_to_paid() {
        let action = disposition(
            SettlementEventKind::CheckoutCompleted,
            BookingStatus::Pending,
            150_000,
            Some(150_000),
        );
        assert_eq!(
            action,
            SettlementAction::Transition { to: BookingStatus::Paid, set_confirmed: true }
        );
    }

    #[test]
    fn confirm_without_amount_still_applies() {
        let action = disposition(
            SettlementEventKind::CheckoutCompleted,
            BookingStatus::Pending,
            150_000,
            None,
        );
        assert!(matches!(action, SettlementAction::Transition { .. }));
    }

    #[test]
    fn confirm_on_paid_is_a_noop_success() {
        let action = disposition(
            SettlementEventKind::CheckoutCompleted,
            BookingStatus::Paid,
            150_000,
            Some(150_000),
        );
        assert_eq!(action, SettlementAction::AlreadySettled);
    }

    #[test]
    fn divergent_amount_is_rejected_in_any_state() {
        for status in [BookingStatus::Pending, BookingStatus::Paid] {
            let action = disposition(
                SettlementEventKind::CheckoutCompleted,
                status,
                150_000,
                Some(149_999),
            );
            assert!(matches!(action, SettlementAction::Reject { .. }), "status {status}");
        }
    }

    #[test]
    fn refund_only_applies_to_paid() {
        assert_eq!(
            disposition(SettlementEventKind::ChargeRefunded, BookingStatus::Paid, 1000, None),
            SettlementAction::Transition { to: BookingStatus::Refunded, set_confirmed: false }
        );
        assert_eq!(
            disposition(SettlementEventKind::ChargeRefunded, BookingStatus::Refunded, 1000, None),
            SettlementAction::AlreadySettled
        );
        assert!(matches!(
            disposition(SettlementEventKind::ChargeRefunded, BookingStatus::Pending, 1000, None),
            SettlementAction::Reject { .. }
        ));
    }

    #[test]
    fn expiry_only_applies_to_pending() {
        assert_eq!(
            disposition(SettlementEventKind::CheckoutExpired, BookingStatus::Pending, 1000, None),
            SettlementAction::Transition { to: BookingStatus::Expired, set_confirmed: false }
        );
        // A checkout that expired after the payment succeeded is a provider
        // anomaly and must be surfaced, not applied.
        assert!(matches!(
            disposition(SettlementEventKind::CheckoutExpired, BookingStatus::Paid, 1000, None),
            SettlementAction::Reject { .. }
        ));
    }

    #[test]
    fn cancel_applies_to_paid_only() {
        assert_eq!(
            disposition(SettlementEventKind::PaymentCanceled, BookingStatus::Paid, 1000, None),
            SettlementAction::Transition { to: BookingStatus::Canceled, set_confirmed: false }
        );
        assert!(matches!(
            disposition(SettlementEventKind::PaymentCanceled, BookingStatus::Pending, 1000, None),
            SettlementAction::Reject { .. }
        ));
        assert!(matches!(
            disposition(SettlementEventKind::PaymentCanceled, BookingStatus::Expired, 1000, None),
            SettlementAction::Reject { .. }
        ));
    }
}
