use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use veranda_core::error::BookingError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    ValidationError(String),
    NotFoundError(String),
    DateConflictError(String),
    LockBusyError(String),
    UnprocessableError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    /// Maps the domain taxonomy onto HTTP. Only `LockBusy` is marked
    /// retryable; the client contract is retry-with-jitter on 503 and give
    /// up immediately on everything else.
    pub fn from_booking(err: BookingError) -> Self {
        match err {
            BookingError::Validation(msg) => Self::ValidationError(msg),
            BookingError::DateConflict(date) => {
                Self::DateConflictError(format!("date {date} is already taken"))
            }
            BookingError::LockBusy(date) => {
                Self::LockBusyError(format!("date {date} is being booked by another request"))
            }
            BookingError::NotFound(what) => Self::NotFoundError(what),
            BookingError::Storage(msg) => Self::InternalServerError(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, retryable, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", false, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "VALIDATION", false, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", false, msg),
            AppError::DateConflictError(msg) => (StatusCode::CONFLICT, "DATE_TAKEN", false, msg),
            AppError::LockBusyError(msg) => (StatusCode::SERVICE_UNAVAILABLE, "LOCK_BUSY", true, msg),
            AppError::UnprocessableError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "REJECTED", false, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", false, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", false, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "code": code,
            "retryable": retryable,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
