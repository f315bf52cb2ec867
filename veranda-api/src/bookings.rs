use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use veranda_booking::models::{Booking, BookingStatus, CustomerDetails, ItemKind, NewBooking};
use veranda_core::tenant::Tenant;
use veranda_shared::events::BookingCreatedEvent;
use veranda_shared::pii::Masked;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/{id}", get(get_booking))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub package_id: Uuid,
    pub event_date: NaiveDate,
    pub customer: CustomerRequest,
    #[serde(default)]
    pub add_on_ids: Vec<Uuid>,
    /// The total the client displayed to the customer. The engine recomputes
    /// the real total server-side and rejects on any difference.
    pub total_cents: i64,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub package_id: Uuid,
    pub event_date: NaiveDate,
    pub status: BookingStatus,
    pub total_cents: i64,
    pub platform_fee_cents: i64,
    pub tenant_revenue_cents: i64,
    pub payment_reference: Option<String>,
    pub items: Vec<BookingItemResponse>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct BookingItemResponse {
    pub kind: ItemKind,
    pub item_id: Uuid,
    pub name: String,
    pub price_cents: i64,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        BookingResponse {
            id: booking.id,
            package_id: booking.package_id,
            event_date: booking.event_date,
            status: booking.status,
            total_cents: booking.total_cents,
            platform_fee_cents: booking.platform_fee_cents,
            tenant_revenue_cents: booking.total_cents - booking.platform_fee_cents,
            payment_reference: booking.payment_reference,
            items: booking
                .items
                .into_iter()
                .map(|item| BookingItemResponse {
                    kind: item.kind,
                    item_id: item.item_id,
                    name: item.name,
                    price_cents: item.price_cents,
                })
                .collect(),
            created_at: booking.created_at,
            confirmed_at: booking.confirmed_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/bookings
/// Reserve an event date. Succeeds for exactly one caller per (tenant, date).
async fn create_booking(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    if req.customer.name.trim().is_empty() {
        return Err(AppError::ValidationError("customer name must not be empty".into()));
    }
    if !req.customer.email.contains('@') {
        return Err(AppError::ValidationError("customer email is not valid".into()));
    }

    let request = NewBooking {
        package_id: req.package_id,
        event_date: req.event_date,
        customer: CustomerDetails {
            name: req.customer.name,
            email: Masked::from(req.customer.email),
            phone: req.customer.phone,
        },
        add_on_ids: req.add_on_ids,
        submitted_total_cents: req.total_cents,
        payment_reference: req.payment_reference,
    };

    let booking = state
        .bookings
        .create_booking(&tenant, request)
        .await
        .map_err(AppError::from_booking)?;

    state
        .events
        .booking_created(&BookingCreatedEvent {
            booking_id: booking.id,
            tenant_id: booking.tenant_id,
            package_id: booking.package_id,
            event_date: booking.event_date,
            total_cents: booking.total_cents,
            timestamp: Utc::now().timestamp(),
        })
        .await;

    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

/// GET /v1/bookings/{id}
/// Retrieve one of the calling tenant's bookings. Another tenant's booking
/// id answers 404, indistinguishable from a nonexistent one.
async fn get_booking(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state
        .bookings
        .get_booking(tenant.id, booking_id)
        .await
        .map_err(AppError::from_booking)?
        .ok_or_else(|| AppError::NotFoundError(format!("booking {booking_id}")))?;

    Ok(Json(BookingResponse::from(booking)))
}
