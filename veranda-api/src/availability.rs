use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use veranda_core::tenant::Tenant;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/availability", get(list_unavailable_dates))
        .route("/v1/availability/{date}", get(check_date))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub unavailable_dates: Vec<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct DateAvailabilityResponse {
    pub date: NaiveDate,
    pub available: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/availability?from=2026-06-01&to=2026-08-31
/// Dates a public calendar must grey out for this tenant.
async fn list_unavailable_dates(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    if query.from > query.to {
        return Err(AppError::ValidationError("`from` must not be after `to`".into()));
    }
    let window = state.business_rules.availability_window_days;
    if (query.to - query.from).num_days() + 1 > window {
        return Err(AppError::ValidationError(format!(
            "requested range exceeds the {window}-day window"
        )));
    }

    let unavailable_dates = state
        .availability
        .unavailable_dates(tenant.id, query.from, query.to)
        .await
        .map_err(AppError::from_booking)?;

    Ok(Json(AvailabilityResponse {
        from: query.from,
        to: query.to,
        unavailable_dates,
    }))
}

/// GET /v1/availability/2026-06-01
/// Point check straight off committed state; the answer can be stale the
/// moment it leaves, which is why the booking engine rechecks.
async fn check_date(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DateAvailabilityResponse>, AppError> {
    let available = state
        .availability
        .is_available(tenant.id, date)
        .await
        .map_err(AppError::from_booking)?;

    Ok(Json(DateAvailabilityResponse { date, available }))
}
