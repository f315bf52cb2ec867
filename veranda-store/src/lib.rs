pub mod app_config;
pub mod availability_repo;
pub mod booking_repo;
pub mod catalog_repo;
pub mod database;
pub mod events;
pub mod redis_repo;
pub mod settlement_repo;
pub mod tenant_repo;

pub use availability_repo::PgAvailabilityStore;
pub use booking_repo::PgBookingStore;
pub use catalog_repo::PgCatalogStore;
pub use database::DbClient;
pub use events::EventProducer;
pub use redis_repo::RedisClient;
pub use settlement_repo::PgSettlementStore;
pub use tenant_repo::PgTenantDirectory;

/// Logs the full driver error and degrades it to the opaque storage variant.
/// Conflict-shaped errors are classified before this fallback applies.
pub(crate) fn storage_err(err: sqlx::Error) -> veranda_core::error::BookingError {
    tracing::error!(error = %err, "database error");
    veranda_core::error::BookingError::Storage(err.to_string())
}
