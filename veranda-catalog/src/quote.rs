use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::package::{AddOn, Package};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineKind {
    Package,
    AddOn,
}

/// One priced line of a quote. The package line always comes first, add-on
/// lines follow in the order the caller selected them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteLine {
    pub kind: LineKind,
    pub item_id: Uuid,
    pub name: String,
    pub price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub total_cents: i64,
    pub lines: Vec<QuoteLine>,
}

#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("package {0} is not currently bookable")]
    InactivePackage(Uuid),

    #[error("unknown add-on: {0}")]
    UnknownAddOn(Uuid),

    #[error("add-on {0} is not currently bookable")]
    InactiveAddOn(Uuid),

    #[error("add-on {0} selected more than once")]
    DuplicateAddOn(Uuid),

    #[error("submitted total {submitted} does not match computed total {expected}")]
    PriceMismatch { expected: i64, submitted: i64 },
}

/// Recomputes the price of a selection from catalog rows. Client-submitted
/// totals are never trusted; the engine prices the package and the selected
/// add-ons itself and compares.
pub fn build_quote(package: &Package, add_ons: &[AddOn], selected: &[Uuid]) -> Result<Quote, QuoteError> {
    if !package.is_active {
        return Err(QuoteError::InactivePackage(package.id));
    }

    let mut lines = Vec::with_capacity(1 + selected.len());
    lines.push(QuoteLine {
        kind: LineKind::Package,
        item_id: package.id,
        name: package.name.clone(),
        price_cents: package.price_cents,
    });

    let mut seen: Vec<Uuid> = Vec::with_capacity(selected.len());
    for id in selected {
        if seen.contains(id) {
            return Err(QuoteError::DuplicateAddOn(*id));
        }
        seen.push(*id);

        let add_on = add_ons
            .iter()
            .find(|a| a.id == *id)
            .ok_or(QuoteError::UnknownAddOn(*id))?;
        if !add_on.is_active {
            return Err(QuoteError::InactiveAddOn(*id));
        }
        lines.push(QuoteLine {
            kind: LineKind::AddOn,
            item_id: add_on.id,
            name: add_on.name.clone(),
            price_cents: add_on.price_cents,
        });
    }

    let total_cents = lines.iter().map(|l| l.price_cents).sum();
    Ok(Quote { total_cents, lines })
}

impl Quote {
    /// Anti-tamper check: the client echoes the total it displayed, and a
    /// disagreement aborts the booking rather than silently repricing.
    pub fn verify_submitted_total(&self, submitted: i64) -> Result<(), QuoteError> {
        if submitted != self.total_cents {
            return Err(QuoteError::PriceMismatch {
                expected: self.total_cents,
                submitted,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(tenant_id: Uuid) -> (Package, Vec<AddOn>) {
        let package = Package::new(tenant_id, "Vineyard ceremony".into(), None, 150_000).unwrap();
        let add_ons = vec![
            AddOn::new(tenant_id, "Photographer".into(), 40_000).unwrap(),
            AddOn::new(tenant_id, "Live quartet".into(), 25_000).unwrap(),
        ];
        (package, add_ons)
    }

    #[test]
    fn quote_totals_package_and_selected_add_ons() {
        let tenant_id = Uuid::new_v4();
        let (package, add_ons) = fixture(tenant_id);
        let selected = vec![add_ons[1].id, add_ons[0].id];

        let quote = build_quote(&package, &add_ons, &selected).unwrap();

        assert_eq!(quote.total_cents, 215_000);
        assert_eq!(quote.lines.len(), 3);
        assert_eq!(quote.lines[0].kind, LineKind::Package);
        // Add-on lines preserve the caller's selection order.
        assert_eq!(quote.lines[1].item_id, add_ons[1].id);
        assert_eq!(quote.lines[2].item_id, add_ons[0].id);
    }

    #[test]
    fn empty_selection_prices_the_package_alone() {
        let tenant_id = Uuid::new_v4();
        let (package, add_ons) = fixture(tenant_id);

        let quote = build_quote(&package, &add_ons, &[]).unwrap();

        assert_eq!(quote.total_cents, 150_000);
        assert_eq!(quote.lines.len(), 1);
    }

    #[test]
    fn tampered_total_is_rejected() {
        let tenant_id = Uuid::new_v4();
        let (package, add_ons) = fixture(tenant_id);
        let quote = build_quote(&package, &add_ons, &[add_ons[0].id]).unwrap();

        let err = quote.verify_submitted_total(1).unwrap_err();
        match err {
            QuoteError::PriceMismatch { expected, submitted } => {
                assert_eq!(expected, 190_000);
                assert_eq!(submitted, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_add_on_selection_is_rejected() {
        let tenant_id = Uuid::new_v4();
        let (package, add_ons) = fixture(tenant_id);
        let id = add_ons[0].id;

        let err = build_quote(&package, &add_ons, &[id, id]).unwrap_err();
        assert!(matches!(err, QuoteError::DuplicateAddOn(d) if d == id));
    }

    #[test]
    fn unknown_add_on_is_rejected() {
        let tenant_id = Uuid::new_v4();
        let (package, add_ons) = fixture(tenant_id);
        let stranger = Uuid::new_v4();

        let err = build_quote(&package, &add_ons, &[stranger]).unwrap_err();
        assert!(matches!(err, QuoteError::UnknownAddOn(u) if u == stranger));
    }

    #[test]
    fn inactive_package_cannot_be_quoted() {
        let tenant_id = Uuid::new_v4();
        let (mut package, add_ons) = fixture(tenant_id);
        package.is_active = false;

        let err = build_quote(&package, &add_ons, &[]).unwrap_err();
        assert!(matches!(err, QuoteError::InactivePackage(_)));
    }

    #[test]
    fn inactive_add_on_cannot_be_quoted() {
        let tenant_id = Uuid::new_v4();
        let (package, mut add_ons) = fixture(tenant_id);
        add_ons[0].is_active = false;
        let id = add_ons[0].id;

        let err = build_quote(&package, &add_ons, &[id]).unwrap_err();
        assert!(matches!(err, QuoteError::InactiveAddOn(i) if i == id));
    }
}
