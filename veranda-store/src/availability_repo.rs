use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::stream::BoxStream;
use futures_util::TryStreamExt;
use sqlx::PgPool;
use uuid::Uuid;
use veranda_core::error::BookingError;
use veranda_core::repository::AvailabilityStore;

use crate::storage_err;

/// Calendar reads straight from committed rows. No locks are taken here; the
/// write path's constraints guarantee a date never reads available after a
/// booking for it has committed.
#[derive(Clone)]
pub struct PgAvailabilityStore {
    pool: PgPool,
}

const UNAVAILABLE_SQL: &str = "\
    SELECT date FROM blackout_dates \
    WHERE tenant_id = $1 AND date BETWEEN $2 AND $3 \
    UNION \
    SELECT event_date FROM bookings \
    WHERE tenant_id = $1 AND event_date BETWEEN $2 AND $3 \
    AND status IN ('PENDING', 'PAID') \
    ORDER BY 1";

const DAY_FREE_SQL: &str = "\
    SELECT NOT EXISTS (\
        SELECT 1 FROM blackout_dates WHERE tenant_id = $1 AND date = $2\
    ) AND NOT EXISTS (\
        SELECT 1 FROM bookings \
        WHERE tenant_id = $1 AND event_date = $2 AND status IN ('PENDING', 'PAID')\
    )";

impl PgAvailabilityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Row-at-a-time variant for wide windows. Each call opens a fresh
    /// cursor; nothing is carried across calls. The UNION both merges the
    /// blackout and booking sources and deduplicates dates present in both.
    pub fn unavailable_dates_stream(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> BoxStream<'_, Result<NaiveDate, sqlx::Error>> {
        sqlx::query_scalar::<_, NaiveDate>(UNAVAILABLE_SQL)
            .bind(tenant_id)
            .bind(from)
            .bind(to)
            .fetch(&self.pool)
    }
}

#[async_trait]
impl AvailabilityStore for PgAvailabilityStore {
    async fn is_available(&self, tenant_id: Uuid, date: NaiveDate) -> Result<bool, BookingError> {
        sqlx::query_scalar::<_, bool>(DAY_FREE_SQL)
            .bind(tenant_id)
            .bind(date)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)
    }

    async fn unavailable_dates(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>, BookingError> {
        self.unavailable_dates_stream(tenant_id, from, to)
            .try_collect()
            .await
            .map_err(storage_err)
    }
}
