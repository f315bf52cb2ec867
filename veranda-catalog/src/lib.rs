pub mod blackout;
pub mod package;
pub mod quote;

pub use blackout::BlackoutDate;
pub use package::{AddOn, AddOnUpdate, CatalogError, Package, PackageUpdate};
pub use quote::{LineKind, Quote, QuoteError, QuoteLine};
