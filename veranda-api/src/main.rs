use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use veranda_api::{app, state::AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "veranda_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = veranda_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Veranda API on port {}", config.server.port);

    // Postgres Connection + Migrations
    let db = veranda_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Redis Connection
    let redis_client = veranda_store::RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");

    // Kafka Connection
    let kafka_producer = veranda_store::EventProducer::new(&config.kafka.brokers)
        .expect("Failed to create Kafka producer");

    let app_state = AppState {
        tenants: Arc::new(veranda_store::PgTenantDirectory::new(db.pool.clone())),
        availability: Arc::new(veranda_store::PgAvailabilityStore::new(db.pool.clone())),
        bookings: Arc::new(veranda_store::PgBookingStore::new(
            db.pool.clone(),
            config.business_rules.booking_tx_timeout_ms,
        )),
        settlements: Arc::new(veranda_store::PgSettlementStore::new(db.pool.clone())),
        catalog: Arc::new(veranda_store::PgCatalogStore::new(db.pool.clone())),
        events: Arc::new(kafka_producer),
        redis: Arc::new(redis_client),
        business_rules: config.business_rules.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.expect("Failed to bind address");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .expect("Server error");
}
