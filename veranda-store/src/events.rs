use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info};
use veranda_core::repository::EventPublisher;
use veranda_shared::events::{BookingConfirmedEvent, BookingCreatedEvent};

pub const TOPIC_BOOKING_CREATED: &str = "booking.created";
pub const TOPIC_BOOKING_CONFIRMED: &str = "booking.confirmed";

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    pub async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                info!(
                    "Sent message to {}/{}: partition {} offset {}",
                    topic, key, delivery.partition, delivery.offset
                );
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(e)
            }
        }
    }
}

// Delivery failures are logged inside `publish`; a booking request never
// fails because the broker is down.
#[async_trait]
impl EventPublisher for EventProducer {
    async fn booking_created(&self, event: &BookingCreatedEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => {
                let _ = self
                    .publish(TOPIC_BOOKING_CREATED, &event.booking_id.to_string(), &payload)
                    .await;
            }
            Err(e) => error!("Failed to serialize booking.created event: {}", e),
        }
    }

    async fn booking_confirmed(&self, event: &BookingConfirmedEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => {
                let _ = self
                    .publish(TOPIC_BOOKING_CONFIRMED, &event.booking_id.to_string(), &payload)
                    .await;
            }
            Err(e) => error!("Failed to serialize booking.confirmed event: {}", e),
        }
    }
}
