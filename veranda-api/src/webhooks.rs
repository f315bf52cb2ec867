use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use veranda_booking::models::BookingStatus;
use veranda_booking::settlement::{SettlementEnvelope, SettlementOutcome};
use veranda_shared::events::BookingConfirmedEvent;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SettlementWebhook {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub data: serde_json::Value,
}

/// POST /v1/webhooks/settlement
/// One provider delivery. 200 means "stop redelivering" (applied or known
/// duplicate); 422 means the event is on record but cannot be applied.
pub async fn handle_settlement_webhook(
    State(state): State<AppState>,
    Json(payload): Json<SettlementWebhook>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    tracing::info!("Received webhook: {} for event {}", payload.type_, payload.id);

    let event_id = payload.id.clone();
    let envelope = SettlementEnvelope {
        event_id: payload.id,
        event_type: payload.type_,
        payload: payload.data,
    };

    let outcome = state
        .settlements
        .apply_settlement(envelope)
        .await
        .map_err(AppError::from_booking)?;

    match outcome {
        SettlementOutcome::Applied { transition } => {
            if let Some(applied) = transition {
                if applied.to == BookingStatus::Paid {
                    state
                        .events
                        .booking_confirmed(&BookingConfirmedEvent {
                            booking_id: applied.booking_id,
                            tenant_id: applied.tenant_id,
                            event_date: applied.event_date,
                            settlement_event_id: event_id,
                            timestamp: Utc::now().timestamp(),
                        })
                        .await;
                }
            }
            Ok((StatusCode::OK, Json(json!({ "status": "APPLIED" }))))
        }
        SettlementOutcome::Duplicate => Ok((StatusCode::OK, Json(json!({ "status": "DUPLICATE" })))),
        SettlementOutcome::Rejected { reason } => Err(AppError::UnprocessableError(reason)),
    }
}
