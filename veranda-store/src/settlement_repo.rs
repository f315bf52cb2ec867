use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use veranda_booking::models::BookingStatus;
use veranda_booking::settlement::{
    disposition, AppliedTransition, SettlementAction, SettlementEnvelope, SettlementEventKind,
    SettlementEventRecord, SettlementEventStatus, SettlementOutcome, SettlementPayload,
};
use veranda_core::error::BookingError;
use veranda_core::repository::SettlementStore;

use crate::storage_err;

/// Settlement ledger: every provider delivery is recorded first, processed
/// second. The event id is the dedup key; a booking state change and the
/// PROCESSED mark for the event that caused it commit in one transaction.
#[derive(Clone)]
pub struct PgSettlementStore {
    pool: PgPool,
}

impl PgSettlementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Marks the ledger row FAILED with a reason. FAILED rows keep a NULL
    /// `processed_at`; only successful processing stamps it.
    async fn mark_failed(&self, event_id: &str, reason: &str) -> Result<(), BookingError> {
        sqlx::query("UPDATE settlement_events SET status = 'FAILED', last_error = $2 WHERE event_id = $1")
            .bind(event_id)
            .bind(reason)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// Runs the state machine for an event already present in the ledger.
    async fn process_event(
        &self,
        event_id: &str,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<SettlementOutcome, BookingError> {
        let Some(kind) = SettlementEventKind::from_event_type(event_type) else {
            let reason = format!("unsupported event type: {event_type}");
            self.mark_failed(event_id, &reason).await?;
            tracing::warn!(event_id, event_type, "settlement event rejected");
            return Ok(SettlementOutcome::Rejected { reason });
        };

        let parsed = match SettlementPayload::parse(payload) {
            Ok(parsed) => parsed,
            Err(err) => {
                let reason = err.to_string();
                self.mark_failed(event_id, &reason).await?;
                tracing::warn!(event_id, event_type, error = %reason, "settlement payload unreadable");
                return Ok(SettlementOutcome::Rejected { reason });
            }
        };

        // Denormalized onto the ledger row so operators can filter by tenant
        // even for events that end up rejected further down.
        sqlx::query("UPDATE settlement_events SET tenant_id = $2, payment_reference = $3 WHERE event_id = $1")
            .bind(event_id)
            .bind(parsed.tenant_id)
            .bind(&parsed.payment_reference)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        #[derive(sqlx::FromRow)]
        struct LockedBooking {
            id: Uuid,
            event_date: NaiveDate,
            status: String,
            total_cents: i64,
        }

        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        // The booking is addressed by (tenant, payment_reference); a bare
        // booking id in a payload is never trusted.
        let booking = sqlx::query_as::<_, LockedBooking>(
            "SELECT id, event_date, status, total_cents FROM bookings \
             WHERE tenant_id = $1 AND payment_reference = $2 FOR UPDATE",
        )
        .bind(parsed.tenant_id)
        .bind(&parsed.payment_reference)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?;

        let Some(booking) = booking else {
            drop(tx);
            let reason = format!(
                "no booking with payment reference {} for tenant {}",
                parsed.payment_reference, parsed.tenant_id
            );
            self.mark_failed(event_id, &reason).await?;
            tracing::warn!(event_id, tenant_id = %parsed.tenant_id, "settlement event has no matching booking");
            return Ok(SettlementOutcome::Rejected { reason });
        };

        let current: BookingStatus = booking
            .status
            .parse()
            .map_err(|e: veranda_booking::models::BookingStateError| BookingError::Storage(e.to_string()))?;

        match disposition(kind, current, booking.total_cents, parsed.amount_cents) {
            SettlementAction::Transition { to, set_confirmed } => {
                if set_confirmed {
                    sqlx::query("UPDATE bookings SET status = $2, confirmed_at = now() WHERE id = $1")
                } else {
                    sqlx::query("UPDATE bookings SET status = $2 WHERE id = $1")
                }
                .bind(booking.id)
                .bind(to.as_str())
                .execute(&mut *tx)
                .await
                .map_err(storage_err)?;

                sqlx::query(
                    "UPDATE settlement_events \
                     SET status = 'PROCESSED', processed_at = now(), last_error = NULL \
                     WHERE event_id = $1",
                )
                .bind(event_id)
                .execute(&mut *tx)
                .await
                .map_err(storage_err)?;

                tx.commit().await.map_err(storage_err)?;

                tracing::info!(
                    event_id,
                    tenant_id = %parsed.tenant_id,
                    booking_id = %booking.id,
                    from = %current,
                    to = %to,
                    "settlement applied"
                );
                Ok(SettlementOutcome::Applied {
                    transition: Some(AppliedTransition {
                        booking_id: booking.id,
                        tenant_id: parsed.tenant_id,
                        event_date: booking.event_date,
                        to,
                    }),
                })
            }
            SettlementAction::AlreadySettled => {
                // The booking already sits in the target state; only the
                // ledger row moves. `confirmed_at` is left exactly as is.
                sqlx::query(
                    "UPDATE settlement_events \
                     SET status = 'PROCESSED', processed_at = now(), last_error = NULL \
                     WHERE event_id = $1",
                )
                .bind(event_id)
                .execute(&mut *tx)
                .await
                .map_err(storage_err)?;
                tx.commit().await.map_err(storage_err)?;

                tracing::info!(event_id, booking_id = %booking.id, status = %current, "settlement already applied");
                Ok(SettlementOutcome::Applied { transition: None })
            }
            SettlementAction::Reject { reason } => {
                drop(tx);
                self.mark_failed(event_id, &reason).await?;
                tracing::warn!(event_id, booking_id = %booking.id, reason, "settlement event rejected");
                Ok(SettlementOutcome::Rejected { reason })
            }
        }
    }
}

#[derive(sqlx::FromRow)]
struct SettlementEventRow {
    event_id: String,
    event_type: String,
    status: String,
    attempts: i32,
    last_error: Option<String>,
    tenant_id: Option<Uuid>,
    payment_reference: Option<String>,
    payload: serde_json::Value,
    received_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl TryFrom<SettlementEventRow> for SettlementEventRecord {
    type Error = BookingError;

    fn try_from(row: SettlementEventRow) -> Result<Self, Self::Error> {
        let status: SettlementEventStatus = row.status.parse().map_err(BookingError::Storage)?;
        Ok(SettlementEventRecord {
            event_id: row.event_id,
            event_type: row.event_type,
            status,
            attempts: row.attempts,
            last_error: row.last_error,
            tenant_id: row.tenant_id,
            payment_reference: row.payment_reference,
            payload: row.payload,
            received_at: row.received_at,
            processed_at: row.processed_at,
        })
    }
}

const EVENT_COLUMNS: &str = "event_id, event_type, status, attempts, last_error, tenant_id, \
     payment_reference, payload, received_at, processed_at";

#[async_trait]
impl SettlementStore for PgSettlementStore {
    async fn apply_settlement(&self, envelope: SettlementEnvelope) -> Result<SettlementOutcome, BookingError> {
        // The ledger insert commits on its own before any processing, so a
        // crash mid-processing still leaves the delivery on record.
        let inserted = sqlx::query(
            "INSERT INTO settlement_events (event_id, event_type, payload, status, received_at) \
             VALUES ($1, $2, $3, 'PENDING', now()) \
             ON CONFLICT (event_id) DO NOTHING",
        )
        .bind(&envelope.event_id)
        .bind(&envelope.event_type)
        .bind(&envelope.payload)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if inserted.rows_affected() == 0 {
            sqlx::query("UPDATE settlement_events SET attempts = attempts + 1 WHERE event_id = $1")
                .bind(&envelope.event_id)
                .execute(&self.pool)
                .await
                .map_err(storage_err)?;
            tracing::info!(event_id = %envelope.event_id, "duplicate settlement delivery ignored");
            return Ok(SettlementOutcome::Duplicate);
        }

        self.process_event(&envelope.event_id, &envelope.event_type, &envelope.payload)
            .await
    }

    async fn replay_event(&self, event_id: &str) -> Result<SettlementOutcome, BookingError> {
        let row = sqlx::query_as::<_, SettlementEventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM settlement_events WHERE event_id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?
        .ok_or_else(|| BookingError::NotFound(format!("settlement event {event_id}")))?;

        if row.status == SettlementEventStatus::Processed.as_str() {
            return Ok(SettlementOutcome::Duplicate);
        }

        sqlx::query("UPDATE settlement_events SET attempts = attempts + 1 WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        tracing::info!(event_id, attempts = row.attempts + 1, "replaying settlement event");
        self.process_event(&row.event_id, &row.event_type, &row.payload).await
    }

    async fn list_events(
        &self,
        tenant_id: Uuid,
        status: Option<SettlementEventStatus>,
    ) -> Result<Vec<SettlementEventRecord>, BookingError> {
        let rows = sqlx::query_as::<_, SettlementEventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM settlement_events \
             WHERE tenant_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY received_at DESC"
        ))
        .bind(tenant_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.into_iter().map(SettlementEventRecord::try_from).collect()
    }
}
