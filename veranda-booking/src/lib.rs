pub mod models;
pub mod settlement;

pub use models::{Booking, BookingItem, BookingStatus, Customer, CustomerDetails, ItemKind, NewBooking};
pub use settlement::{
    AppliedTransition, SettlementAction, SettlementEnvelope, SettlementEventKind,
    SettlementEventStatus, SettlementOutcome, SettlementPayload,
};
