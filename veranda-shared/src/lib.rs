pub mod events;
pub mod pii;

pub use events::{BookingConfirmedEvent, BookingCreatedEvent};
pub use pii::Masked;
