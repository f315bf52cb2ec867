use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use veranda_catalog::blackout::BlackoutDate;
use veranda_catalog::package::{AddOn, AddOnUpdate, Package, PackageUpdate};
use veranda_core::error::BookingError;
use veranda_core::repository::CatalogStore;

use crate::storage_err;

#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PackageRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    description: Option<String>,
    price_cents: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PackageRow> for Package {
    fn from(row: PackageRow) -> Self {
        Package {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct AddOnRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    price_cents: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<AddOnRow> for AddOn {
    fn from(row: AddOnRow) -> Self {
        AddOn {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            price_cents: row.price_cents,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

const PACKAGE_COLUMNS: &str = "id, tenant_id, name, description, price_cents, is_active, created_at, updated_at";
const ADD_ON_COLUMNS: &str = "id, tenant_id, name, price_cents, is_active, created_at";

/// Reads a package inside an open booking transaction so the price the
/// quote is built from is the one the transaction will commit against.
pub(crate) async fn fetch_package_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    package_id: Uuid,
) -> Result<Option<Package>, BookingError> {
    let row = sqlx::query_as::<_, PackageRow>(&format!(
        "SELECT {PACKAGE_COLUMNS} FROM packages WHERE tenant_id = $1 AND id = $2"
    ))
    .bind(tenant_id)
    .bind(package_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(storage_err)?;
    Ok(row.map(Package::from))
}

pub(crate) async fn fetch_add_ons_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    add_on_ids: &[Uuid],
) -> Result<Vec<AddOn>, BookingError> {
    if add_on_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, AddOnRow>(&format!(
        "SELECT {ADD_ON_COLUMNS} FROM add_ons WHERE tenant_id = $1 AND id = ANY($2)"
    ))
    .bind(tenant_id)
    .bind(add_on_ids)
    .fetch_all(&mut **tx)
    .await
    .map_err(storage_err)?;
    Ok(rows.into_iter().map(AddOn::from).collect())
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn create_package(&self, package: &Package) -> Result<(), BookingError> {
        sqlx::query(
            "INSERT INTO packages (id, tenant_id, name, description, price_cents, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(package.id)
        .bind(package.tenant_id)
        .bind(&package.name)
        .bind(&package.description)
        .bind(package.price_cents)
        .bind(package.is_active)
        .bind(package.created_at)
        .bind(package.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn list_packages(&self, tenant_id: Uuid) -> Result<Vec<Package>, BookingError> {
        let rows = sqlx::query_as::<_, PackageRow>(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages WHERE tenant_id = $1 ORDER BY created_at"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(rows.into_iter().map(Package::from).collect())
    }

    async fn update_package(
        &self,
        tenant_id: Uuid,
        package_id: Uuid,
        update: PackageUpdate,
    ) -> Result<Package, BookingError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let row = sqlx::query_as::<_, PackageRow>(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(tenant_id)
        .bind(package_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?
        .ok_or_else(|| BookingError::NotFound(format!("package {package_id}")))?;

        let mut package = Package::from(row);
        update.apply_to(&mut package)?;

        sqlx::query(
            "UPDATE packages SET name = $3, description = $4, price_cents = $5, is_active = $6, updated_at = $7 \
             WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(package_id)
        .bind(&package.name)
        .bind(&package.description)
        .bind(package.price_cents)
        .bind(package.is_active)
        .bind(package.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;
        Ok(package)
    }

    async fn create_add_on(&self, add_on: &AddOn) -> Result<(), BookingError> {
        sqlx::query(
            "INSERT INTO add_ons (id, tenant_id, name, price_cents, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(add_on.id)
        .bind(add_on.tenant_id)
        .bind(&add_on.name)
        .bind(add_on.price_cents)
        .bind(add_on.is_active)
        .bind(add_on.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn list_add_ons(&self, tenant_id: Uuid) -> Result<Vec<AddOn>, BookingError> {
        let rows = sqlx::query_as::<_, AddOnRow>(&format!(
            "SELECT {ADD_ON_COLUMNS} FROM add_ons WHERE tenant_id = $1 ORDER BY created_at"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(rows.into_iter().map(AddOn::from).collect())
    }

    async fn update_add_on(
        &self,
        tenant_id: Uuid,
        add_on_id: Uuid,
        update: AddOnUpdate,
    ) -> Result<AddOn, BookingError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let row = sqlx::query_as::<_, AddOnRow>(&format!(
            "SELECT {ADD_ON_COLUMNS} FROM add_ons WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(tenant_id)
        .bind(add_on_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?
        .ok_or_else(|| BookingError::NotFound(format!("add-on {add_on_id}")))?;

        let mut add_on = AddOn::from(row);
        update.apply_to(&mut add_on)?;

        sqlx::query(
            "UPDATE add_ons SET name = $3, price_cents = $4, is_active = $5 \
             WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(add_on_id)
        .bind(&add_on.name)
        .bind(add_on.price_cents)
        .bind(add_on.is_active)
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;
        Ok(add_on)
    }

    async fn upsert_blackout(&self, blackout: &BlackoutDate) -> Result<(), BookingError> {
        sqlx::query(
            "INSERT INTO blackout_dates (tenant_id, date, reason, created_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (tenant_id, date) DO UPDATE SET reason = EXCLUDED.reason",
        )
        .bind(blackout.tenant_id)
        .bind(blackout.date)
        .bind(&blackout.reason)
        .bind(blackout.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn remove_blackout(&self, tenant_id: Uuid, date: NaiveDate) -> Result<bool, BookingError> {
        let result = sqlx::query("DELETE FROM blackout_dates WHERE tenant_id = $1 AND date = $2")
            .bind(tenant_id)
            .bind(date)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_blackouts(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<BlackoutDate>, BookingError> {
        #[derive(sqlx::FromRow)]
        struct BlackoutRow {
            tenant_id: Uuid,
            date: NaiveDate,
            reason: Option<String>,
            created_at: DateTime<Utc>,
        }

        let rows = sqlx::query_as::<_, BlackoutRow>(
            "SELECT tenant_id, date, reason, created_at FROM blackout_dates \
             WHERE tenant_id = $1 AND date BETWEEN $2 AND $3 ORDER BY date",
        )
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(rows
            .into_iter()
            .map(|row| BlackoutDate {
                tenant_id: row.tenant_id,
                date: row.date,
                reason: row.reason,
                created_at: row.created_at,
            })
            .collect())
    }
}
