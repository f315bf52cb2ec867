use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post, put},
    Extension, Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use veranda_booking::models::BookingStatus;
use veranda_booking::settlement::{SettlementEventRecord, SettlementEventStatus, SettlementOutcome};
use veranda_catalog::blackout::BlackoutDate;
use veranda_catalog::package::{AddOn, AddOnUpdate, Package, PackageUpdate};
use veranda_core::tenant::Tenant;
use veranda_shared::events::BookingConfirmedEvent;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/blackouts", get(list_blackouts))
        .route("/v1/admin/blackouts/{date}", put(upsert_blackout))
        .route("/v1/admin/blackouts/{date}", delete(remove_blackout))
        .route("/v1/admin/packages", post(create_package))
        .route("/v1/admin/packages", get(list_packages))
        .route("/v1/admin/packages/{id}", patch(update_package))
        .route("/v1/admin/add-ons", post(create_add_on))
        .route("/v1/admin/add-ons", get(list_add_ons))
        .route("/v1/admin/add-ons/{id}", patch(update_add_on))
        .route("/v1/admin/settlement-events", get(list_settlement_events))
        .route("/v1/admin/settlement-events/{event_id}/replay", post(replay_settlement_event))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct BlackoutQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct BlackoutRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePackageRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateAddOnRequest {
    pub name: String,
    pub price_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct SettlementEventsQuery {
    #[serde(default)]
    pub status: Option<SettlementEventStatus>,
}

// ============================================================================
// Blackout Handlers
// ============================================================================

/// GET /v1/admin/blackouts?from=2026-01-01&to=2026-12-31
async fn list_blackouts(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Query(query): Query<BlackoutQuery>,
) -> Result<Json<Vec<BlackoutDate>>, AppError> {
    if query.from > query.to {
        return Err(AppError::ValidationError("`from` must not be after `to`".into()));
    }
    let blackouts = state
        .catalog
        .list_blackouts(tenant.id, query.from, query.to)
        .await
        .map_err(AppError::from_booking)?;
    Ok(Json(blackouts))
}

/// PUT /v1/admin/blackouts/2026-12-25
/// Idempotent: re-putting an existing date just refreshes the reason.
/// Bookings already holding the date are untouched.
async fn upsert_blackout(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(date): Path<NaiveDate>,
    Json(req): Json<BlackoutRequest>,
) -> Result<StatusCode, AppError> {
    let blackout = BlackoutDate::new(tenant.id, date, req.reason);
    state
        .catalog
        .upsert_blackout(&blackout)
        .await
        .map_err(AppError::from_booking)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/admin/blackouts/2026-12-25
async fn remove_blackout(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(date): Path<NaiveDate>,
) -> Result<StatusCode, AppError> {
    let removed = state
        .catalog
        .remove_blackout(tenant.id, date)
        .await
        .map_err(AppError::from_booking)?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFoundError(format!("no blackout on {date}")))
    }
}

// ============================================================================
// Catalog Handlers
// ============================================================================

/// POST /v1/admin/packages
async fn create_package(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Json(req): Json<CreatePackageRequest>,
) -> Result<(StatusCode, Json<Package>), AppError> {
    let package = Package::new(tenant.id, req.name, req.description, req.price_cents)
        .map_err(|e| AppError::from_booking(e.into()))?;
    state
        .catalog
        .create_package(&package)
        .await
        .map_err(AppError::from_booking)?;
    Ok((StatusCode::CREATED, Json(package)))
}

/// GET /v1/admin/packages
/// Admin view includes deactivated packages.
async fn list_packages(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Json<Vec<Package>>, AppError> {
    let packages = state
        .catalog
        .list_packages(tenant.id)
        .await
        .map_err(AppError::from_booking)?;
    Ok(Json(packages))
}

/// PATCH /v1/admin/packages/{id}
async fn update_package(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(package_id): Path<Uuid>,
    Json(update): Json<PackageUpdate>,
) -> Result<Json<Package>, AppError> {
    let package = state
        .catalog
        .update_package(tenant.id, package_id, update)
        .await
        .map_err(AppError::from_booking)?;
    Ok(Json(package))
}

/// POST /v1/admin/add-ons
async fn create_add_on(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Json(req): Json<CreateAddOnRequest>,
) -> Result<(StatusCode, Json<AddOn>), AppError> {
    let add_on = AddOn::new(tenant.id, req.name, req.price_cents)
        .map_err(|e| AppError::from_booking(e.into()))?;
    state
        .catalog
        .create_add_on(&add_on)
        .await
        .map_err(AppError::from_booking)?;
    Ok((StatusCode::CREATED, Json(add_on)))
}

/// GET /v1/admin/add-ons
async fn list_add_ons(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Json<Vec<AddOn>>, AppError> {
    let add_ons = state
        .catalog
        .list_add_ons(tenant.id)
        .await
        .map_err(AppError::from_booking)?;
    Ok(Json(add_ons))
}

/// PATCH /v1/admin/add-ons/{id}
async fn update_add_on(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(add_on_id): Path<Uuid>,
    Json(update): Json<AddOnUpdate>,
) -> Result<Json<AddOn>, AppError> {
    let add_on = state
        .catalog
        .update_add_on(tenant.id, add_on_id, update)
        .await
        .map_err(AppError::from_booking)?;
    Ok(Json(add_on))
}

// ============================================================================
// Settlement Ledger Handlers
// ============================================================================

/// GET /v1/admin/settlement-events?status=FAILED
async fn list_settlement_events(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Query(query): Query<SettlementEventsQuery>,
) -> Result<Json<Vec<SettlementEventRecord>>, AppError> {
    let events = state
        .settlements
        .list_events(tenant.id, query.status)
        .await
        .map_err(AppError::from_booking)?;
    Ok(Json(events))
}

/// POST /v1/admin/settlement-events/{event_id}/replay
/// Reprocesses a stuck or failed event from its stored payload. The outcome
/// is reported in the body either way; a replay that rejects again is an
/// answer, not an HTTP failure.
async fn replay_settlement_event(
    State(state): State<AppState>,
    Extension(_tenant): Extension<Tenant>,
    Path(event_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let outcome = state
        .settlements
        .replay_event(&event_id)
        .await
        .map_err(AppError::from_booking)?;

    let body = match outcome {
        SettlementOutcome::Applied { transition } => {
            // A replayed confirmation owes downstream consumers the same
            // event a live delivery would have produced.
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
            json!({ "status": "APPLIED" })
        }
        SettlementOutcome::Duplicate => json!({ "status": "ALREADY_PROCESSED" }),
        SettlementOutcome::Rejected { reason } => json!({ "status": "REJECTED", "reason": reason }),
    };
    Ok(Json(body))
}
