use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use veranda_booking::models::{Booking, BookingItem, BookingStatus, CustomerDetails, ItemKind, NewBooking};
use veranda_catalog::quote::{build_quote, LineKind};
use veranda_core::commission::split_total;
use veranda_core::error::BookingError;
use veranda_core::repository::BookingStore;
use veranda_core::tenant::Tenant;
use veranda_shared::pii::mask_email;

use crate::catalog_repo::{fetch_add_ons_in_tx, fetch_package_in_tx};
use crate::storage_err;

/// The booking write path. Three independent layers keep one date exclusive
/// per tenant: a non-blocking advisory lock, a recheck inside that lock, and
/// the partial unique index the commit must pass.
#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
    tx_timeout_ms: u64,
}

impl PgBookingStore {
    pub fn new(pool: PgPool, tx_timeout_ms: u64) -> Self {
        Self { pool, tx_timeout_ms }
    }
}

/// Two-int advisory lock key for (tenant, date). The tenant id is folded to
/// 32 bits; a cross-tenant collision only costs a spurious retryable lock
/// failure, never a correctness violation.
fn date_lock_keys(tenant_id: Uuid, date: NaiveDate) -> (i32, i32) {
    let (hi, lo) = tenant_id.as_u64_pair();
    let folded = hi ^ lo;
    let class = ((folded >> 32) as u32 ^ folded as u32) as i32;
    (class, date.num_days_from_ce())
}

/// Maps driver errors on the write path to the caller-facing taxonomy.
/// Kept free of sqlx types in its core so the table is testable directly.
fn classify_sqlstate(code: Option<&str>, constraint: Option<&str>, date: NaiveDate) -> Option<BookingError> {
    match code {
        // Unique violation: the partial active-date index is the expected
        // source; any other unique race on this path is still a conflict,
        // except a reused payment reference which the caller must fix.
        Some("23505") => match constraint {
            Some("bookings_payment_reference_key") => Some(BookingError::Validation(
                "payment reference already attached to another booking".into(),
            )),
            _ => Some(BookingError::DateConflict(date)),
        },
        // Serialization failure and statement-timeout cancel: same remedy
        // as a lost lock race, retry with jitter.
        Some("40001") | Some("57014") => Some(BookingError::LockBusy(date)),
        _ => None,
    }
}

fn classify_write_error(err: sqlx::Error, date: NaiveDate) -> BookingError {
    if let sqlx::Error::Database(db) = &err {
        if let Some(classified) = classify_sqlstate(db.code().as_deref(), db.constraint(), date) {
            return classified;
        }
    }
    storage_err(err)
}

async fn upsert_customer(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    details: &CustomerDetails,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO customers (id, tenant_id, name, email, phone, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (tenant_id, email) DO UPDATE \
         SET name = EXCLUDED.name, \
             phone = COALESCE(EXCLUDED.phone, customers.phone) \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(tenant_id)
    .bind(&details.name)
    .bind(details.email.inner())
    .bind(&details.phone)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    tenant_id: Uuid,
    package_id: Uuid,
    event_date: NaiveDate,
    customer_id: Uuid,
    status: String,
    total_cents: i64,
    platform_fee_cents: i64,
    commission_percent: Decimal,
    payment_reference: Option<String>,
    created_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct BookingItemRow {
    id: Uuid,
    booking_id: Uuid,
    kind: String,
    item_id: Uuid,
    name: String,
    price_cents: i64,
    position: i32,
}

impl BookingRow {
    fn into_booking(self, items: Vec<BookingItem>) -> Result<Booking, BookingError> {
        let status: BookingStatus = self
            .status
            .parse()
            .map_err(|e: veranda_booking::models::BookingStateError| BookingError::Storage(e.to_string()))?;
        Ok(Booking {
            id: self.id,
            tenant_id: self.tenant_id,
            package_id: self.package_id,
            event_date: self.event_date,
            customer_id: self.customer_id,
            status,
            total_cents: self.total_cents,
            platform_fee_cents: self.platform_fee_cents,
            commission_percent: self.commission_percent,
            payment_reference: self.payment_reference,
            items,
            created_at: self.created_at,
            confirmed_at: self.confirmed_at,
        })
    }
}

impl TryFrom<BookingItemRow> for BookingItem {
    type Error = BookingError;

    fn try_from(row: BookingItemRow) -> Result<Self, Self::Error> {
        let kind: ItemKind = row
            .kind
            .parse()
            .map_err(|e: veranda_booking::models::BookingStateError| BookingError::Storage(e.to_string()))?;
        Ok(BookingItem {
            id: row.id,
            booking_id: row.booking_id,
            kind,
            item_id: row.item_id,
            name: row.name,
            price_cents: row.price_cents,
            position: row.position,
        })
    }
}

pub(crate) async fn fetch_booking_items(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: Uuid,
) -> Result<Vec<BookingItem>, BookingError> {
    let rows = sqlx::query_as::<_, BookingItemRow>(
        "SELECT id, booking_id, kind, item_id, name, price_cents, position \
         FROM booking_items WHERE booking_id = $1 ORDER BY position",
    )
    .bind(booking_id)
    .fetch_all(&mut **tx)
    .await
    .map_err(storage_err)?;

    rows.into_iter().map(BookingItem::try_from).collect()
}

const BOOKING_COLUMNS: &str = "id, tenant_id, package_id, event_date, customer_id, status, \
     total_cents, platform_fee_cents, commission_percent, payment_reference, created_at, confirmed_at";

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn create_booking(&self, tenant: &Tenant, request: NewBooking) -> Result<Booking, BookingError> {
        let date = request.event_date;
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        // Dropping `tx` on any early return rolls the transaction back.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
        sqlx::query(&format!("SET LOCAL statement_timeout = {}", self.tx_timeout_ms))
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;

        // Layer 1: non-blocking date lock, released automatically at commit
        // or rollback. Contenders fail immediately instead of queueing.
        let (class, day) = date_lock_keys(tenant.id, date);
        let locked: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1, $2)")
            .bind(class)
            .bind(day)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_err)?;
        if !locked {
            tracing::debug!(tenant_id = %tenant.id, %date, "date lock contended");
            return Err(BookingError::LockBusy(date));
        }

        // Layer 2: recheck under the lock. Blackouts count as taken.
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (\
                 SELECT 1 FROM bookings \
                 WHERE tenant_id = $1 AND event_date = $2 AND status IN ('PENDING', 'PAID')\
             ) OR EXISTS (\
                 SELECT 1 FROM blackout_dates WHERE tenant_id = $1 AND date = $2\
             )",
        )
        .bind(tenant.id)
        .bind(date)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_err)?;
        if taken {
            return Err(BookingError::DateConflict(date));
        }

        // Price from our own catalog rows, never from the client.
        let package = fetch_package_in_tx(&mut tx, tenant.id, request.package_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("package {}", request.package_id)))?;
        let add_ons = fetch_add_ons_in_tx(&mut tx, tenant.id, &request.add_on_ids).await?;

        let quote = build_quote(&package, &add_ons, &request.add_on_ids)?;
        quote.verify_submitted_total(request.submitted_total_cents)?;

        let split = split_total(quote.total_cents, tenant.commission_percent)?;

        let customer_id = upsert_customer(&mut tx, tenant.id, &request.customer)
            .await
            .map_err(|e| classify_write_error(e, date))?;

        let booking_id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO bookings (id, tenant_id, package_id, event_date, customer_id, status, \
                 total_cents, platform_fee_cents, commission_percent, payment_reference, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(booking_id)
        .bind(tenant.id)
        .bind(request.package_id)
        .bind(date)
        .bind(customer_id)
        .bind(BookingStatus::Pending.as_str())
        .bind(quote.total_cents)
        .bind(split.platform_fee_cents)
        .bind(tenant.commission_percent)
        .bind(&request.payment_reference)
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify_write_error(e, date))?;

        let mut items = Vec::with_capacity(quote.lines.len());
        for (position, line) in quote.lines.iter().enumerate() {
            let item = BookingItem {
                id: Uuid::new_v4(),
                booking_id,
                kind: match line.kind {
                    LineKind::Package => ItemKind::Package,
                    LineKind::AddOn => ItemKind::AddOn,
                },
                item_id: line.item_id,
                name: line.name.clone(),
                price_cents: line.price_cents,
                position: position as i32,
            };
            sqlx::query(
                "INSERT INTO booking_items (id, booking_id, kind, item_id, name, price_cents, position) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(item.id)
            .bind(item.booking_id)
            .bind(item.kind.as_str())
            .bind(item.item_id)
            .bind(&item.name)
            .bind(item.price_cents)
            .bind(item.position)
            .execute(&mut *tx)
            .await
            .map_err(|e| classify_write_error(e, date))?;
            items.push(item);
        }

        // Layer 3: the partial unique index gets the final say at commit.
        tx.commit().await.map_err(|e| classify_write_error(e, date))?;

        tracing::info!(
            tenant_id = %tenant.id,
            booking_id = %booking_id,
            event_date = %date,
            total_cents = quote.total_cents,
            platform_fee_cents = split.platform_fee_cents,
            customer = %mask_email(request.customer.email.inner()),
            "booking created"
        );

        Ok(Booking {
            id: booking_id,
            tenant_id: tenant.id,
            package_id: request.package_id,
            event_date: date,
            customer_id,
            status: BookingStatus::Pending,
            total_cents: quote.total_cents,
            platform_fee_cents: split.platform_fee_cents,
            commission_percent: tenant.commission_percent,
            payment_reference: request.payment_reference,
            items,
            created_at,
            confirmed_at: None,
        })
    }

    async fn get_booking(&self, tenant_id: Uuid, booking_id: Uuid) -> Result<Option<Booking>, BookingError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let items = fetch_booking_items(&mut tx, row.id).await?;
        tx.commit().await.map_err(storage_err)?;

        Ok(Some(row.into_booking(items)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 12).unwrap()
    }

    #[test]
    fn lock_keys_are_stable_per_tenant_and_date() {
        let tenant = Uuid::parse_str("a81c6f50-7c51-4d52-b449-2b81ec2aa3b1").unwrap();
        let a = date_lock_keys(tenant, date());
        let b = date_lock_keys(tenant, date());
        assert_eq!(a, b);
    }

    #[test]
    fn lock_keys_differ_across_dates_and_tenants() {
        let tenant_a = Uuid::parse_str("a81c6f50-7c51-4d52-b449-2b81ec2aa3b1").unwrap();
        let tenant_b = Uuid::parse_str("13f1c57e-50a8-44a5-93a8-7b50ec07961f").unwrap();

        let same_day_a = date_lock_keys(tenant_a, date());
        let same_day_b = date_lock_keys(tenant_b, date());
        assert_ne!(same_day_a, same_day_b);

        let next_day = date_lock_keys(tenant_a, date().succ_opt().unwrap());
        assert_ne!(same_day_a, next_day);
        assert_eq!(same_day_a.1 + 1, next_day.1);
    }

    #[test]
    fn unique_violation_on_date_index_is_a_conflict() {
        let err = classify_sqlstate(Some("23505"), Some("bookings_active_date_key"), date());
        assert!(matches!(err, Some(BookingError::DateConflict(d)) if d == date()));
    }

    #[test]
    fn reused_payment_reference_is_a_validation_error() {
        let err = classify_sqlstate(Some("23505"), Some("bookings_payment_reference_key"), date());
        assert!(matches!(err, Some(BookingError::Validation(_))));
    }

    #[test]
    fn serialization_failure_and_timeout_are_retryable() {
        for code in ["40001", "57014"] {
            let err = classify_sqlstate(Some(code), None, date());
            match err {
                Some(inner) => assert!(inner.retryable(), "{code} must map to a retryable error"),
                None => panic!("{code} must be classified"),
            }
        }
    }

    #[test]
    fn unrelated_errors_stay_unclassified() {
        assert!(classify_sqlstate(Some("23503"), None, date()).is_none());
        assert!(classify_sqlstate(None, None, date()).is_none());
    }
}
