use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use veranda_core::error::BookingError;
use veranda_core::repository::TenantDirectory;
use veranda_core::tenant::Tenant;
use veranda_shared::pii::Masked;

use crate::storage_err;

#[derive(Clone)]
pub struct PgTenantDirectory {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct TenantRow {
    id: Uuid,
    slug: String,
    name: String,
    api_key: String,
    commission_percent: Decimal,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Tenant {
            id: row.id,
            slug: row.slug,
            name: row.name,
            api_key: Masked(row.api_key),
            commission_percent: row.commission_percent,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

const TENANT_COLUMNS: &str = "id, slug, name, api_key, commission_percent, is_active, created_at";

impl PgTenantDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantDirectory for PgTenantDirectory {
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Tenant>, BookingError> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE api_key = $1 AND is_active"
        ))
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(Tenant::from))
    }

    async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<Tenant>, BookingError> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1"
        ))
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(Tenant::from))
    }
}
