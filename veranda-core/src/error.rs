use chrono::NaiveDate;
use veranda_catalog::package::CatalogError;
use veranda_catalog::quote::QuoteError;

use crate::commission::CommissionError;

/// Failure taxonomy of the booking and settlement engines.
///
/// Callers branch on the variant: `DateConflict` means pick another date,
/// `LockBusy` means the same request may be retried after a short jittered
/// pause, everything else means the request itself is wrong or the backend
/// is unhealthy. Conflicts are never folded into a generic failure.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("date {0} is already booked or blacked out")]
    DateConflict(NaiveDate),

    #[error("could not acquire the date lock for {0}")]
    LockBusy(NaiveDate),

    #[error("{0} not found")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl BookingError {
    /// Only lock contention (and its serialization-failure equivalent) is
    /// worth retrying with the same input.
    pub fn retryable(&self) -> bool {
        matches!(self, BookingError::LockBusy(_))
    }
}

impl From<CommissionError> for BookingError {
    fn from(err: CommissionError) -> Self {
        BookingError::Validation(err.to_string())
    }
}

impl From<QuoteError> for BookingError {
    fn from(err: QuoteError) -> Self {
        BookingError::Validation(err.to_string())
    }
}

impl From<CatalogError> for BookingError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(what) => BookingError::NotFound(what),
            CatalogError::Invalid(msg) => BookingError::Validation(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_lock_busy_is_retryable() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 12).unwrap();
        assert!(BookingError::LockBusy(date).retryable());
        assert!(!BookingError::DateConflict(date).retryable());
        assert!(!BookingError::Validation("bad".into()).retryable());
        assert!(!BookingError::NotFound("package".into()).retryable());
        assert!(!BookingError::Storage("down".into()).retryable());
    }

    #[test]
    fn quote_errors_become_validation() {
        let err: BookingError = QuoteError::PriceMismatch { expected: 10, submitted: 5 }.into();
        assert!(matches!(err, BookingError::Validation(_)));
    }
}
