use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

// A booking transaction pins its connection until commit; the pool has to
// cover the expected number of concurrent booking attempts.
const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    /// Applies the embedded migrations. Idempotent; safe to run at every
    /// startup.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        let migrator = sqlx::migrate!("../migrations");
        info!("Running {} database migrations...", migrator.migrations.len());
        migrator.run(&self.pool).await?;
        info!("Migrations up to date.");
        Ok(())
    }
}
