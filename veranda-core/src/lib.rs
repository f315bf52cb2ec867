pub mod commission;
pub mod error;
pub mod repository;
pub mod tenant;

pub use commission::{split_total, CommissionError, CommissionSplit};
pub use error::BookingError;
pub use tenant::Tenant;
