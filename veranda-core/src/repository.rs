use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;
use veranda_booking::models::{Booking, NewBooking};
use veranda_booking::settlement::{
    SettlementEnvelope, SettlementEventRecord, SettlementEventStatus, SettlementOutcome,
};
use veranda_catalog::blackout::BlackoutDate;
use veranda_catalog::package::{AddOn, AddOnUpdate, Package, PackageUpdate};
use veranda_shared::events::{BookingConfirmedEvent, BookingCreatedEvent};

use crate::error::BookingError;
use crate::tenant::Tenant;

/// Resolves the tenant behind an incoming request.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Tenant>, BookingError>;

    async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<Tenant>, BookingError>;
}

/// Read-only calendar view. Always backed by committed storage, never by a
/// cache: a date reported available here must really be free at that instant.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn is_available(&self, tenant_id: Uuid, date: NaiveDate) -> Result<bool, BookingError>;

    /// Union of blacked-out and actively booked dates in `[from, to]`,
    /// ordered and deduplicated. Each call is a fresh query.
    async fn unavailable_dates(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>, BookingError>;
}

/// The booking transaction engine.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Creates a PENDING booking, or fails with a typed error. Exactly one
    /// concurrent caller per (tenant, date) can succeed.
    async fn create_booking(&self, tenant: &Tenant, request: NewBooking) -> Result<Booking, BookingError>;

    async fn get_booking(&self, tenant_id: Uuid, booking_id: Uuid) -> Result<Option<Booking>, BookingError>;
}

/// The settlement ledger and its idempotent application logic.
#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// Records and processes one provider delivery. Re-delivery of a known
    /// event id returns `Duplicate` without touching anything.
    async fn apply_settlement(&self, envelope: SettlementEnvelope) -> Result<SettlementOutcome, BookingError>;

    /// Operator-triggered reprocessing of a stored event from its raw payload.
    async fn replay_event(&self, event_id: &str) -> Result<SettlementOutcome, BookingError>;

    async fn list_events(
        &self,
        tenant_id: Uuid,
        status: Option<SettlementEventStatus>,
    ) -> Result<Vec<SettlementEventRecord>, BookingError>;
}

/// Tenant-scoped catalog management.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create_package(&self, package: &Package) -> Result<(), BookingError>;

    async fn list_packages(&self, tenant_id: Uuid) -> Result<Vec<Package>, BookingError>;

    async fn update_package(
        &self,
        tenant_id: Uuid,
        package_id: Uuid,
        update: PackageUpdate,
    ) -> Result<Package, BookingError>;

    async fn create_add_on(&self, add_on: &AddOn) -> Result<(), BookingError>;

    async fn list_add_ons(&self, tenant_id: Uuid) -> Result<Vec<AddOn>, BookingError>;

    async fn update_add_on(
        &self,
        tenant_id: Uuid,
        add_on_id: Uuid,
        update: AddOnUpdate,
    ) -> Result<AddOn, BookingError>;

    async fn upsert_blackout(&self, blackout: &BlackoutDate) -> Result<(), BookingError>;

    /// Returns whether a row was actually removed.
    async fn remove_blackout(&self, tenant_id: Uuid, date: NaiveDate) -> Result<bool, BookingError>;

    async fn list_blackouts(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<BlackoutDate>, BookingError>;
}

/// Best-effort domain event publication after commit. Implementations log
/// and swallow transport failures; a lost event never fails a request.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn booking_created(&self, event: &BookingCreatedEvent);

    async fn booking_confirmed(&self, event: &BookingConfirmedEvent);
}
