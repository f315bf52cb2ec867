use std::sync::Arc;
use veranda_core::repository::{
    AvailabilityStore, BookingStore, CatalogStore, EventPublisher, SettlementStore, TenantDirectory,
};
use veranda_store::app_config::BusinessRules;
use veranda_store::RedisClient;

#[derive(Clone)]
pub struct AppState {
    pub tenants: Arc<dyn TenantDirectory>,
    pub availability: Arc<dyn AvailabilityStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub settlements: Arc<dyn SettlementStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub events: Arc<dyn EventPublisher>,
    pub redis: Arc<RedisClient>,
    pub business_rules: BusinessRules,
}
