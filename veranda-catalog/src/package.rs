use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bookable offering owned by a single tenant. One package is sold per
/// booking; prices are integer minor units (cents).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Package {
    pub fn new(tenant_id: Uuid, name: String, description: Option<String>, price_cents: i64) -> Result<Self, CatalogError> {
        validate_name(&name)?;
        validate_price(price_cents)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            description,
            price_cents,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

/// An optional extra sold alongside a package (same tenant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddOn {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AddOn {
    pub fn new(tenant_id: Uuid, name: String, price_cents: i64) -> Result<Self, CatalogError> {
        validate_name(&name)?;
        validate_price(price_cents)?;
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            price_cents,
            is_active: true,
            created_at: Utc::now(),
        })
    }
}

/// Partial update for an admin PATCH. `None` leaves a field unchanged;
/// clearing a description is done by sending an empty string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub is_active: Option<bool>,
}

impl PackageUpdate {
    pub fn apply_to(&self, package: &mut Package) -> Result<(), CatalogError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
            package.name = name.clone();
        }
        if let Some(description) = &self.description {
            package.description = if description.is_empty() { None } else { Some(description.clone()) };
        }
        if let Some(price) = self.price_cents {
            validate_price(price)?;
            package.price_cents = price;
        }
        if let Some(active) = self.is_active {
            package.is_active = active;
        }
        package.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddOnUpdate {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub is_active: Option<bool>,
}

impl AddOnUpdate {
    pub fn apply_to(&self, add_on: &mut AddOn) -> Result<(), CatalogError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
            add_on.name = name.clone();
        }
        if let Some(price) = self.price_cents {
            validate_price(price)?;
            add_on.price_cents = price;
        }
        if let Some(active) = self.is_active {
            add_on.is_active = active;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog item not found: {0}")]
    NotFound(String),

    #[error("invalid catalog input: {0}")]
    Invalid(String),
}

pub fn validate_name(name: &str) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::Invalid("name must not be empty".into()));
    }
    if name.len() > 200 {
        return Err(CatalogError::Invalid("name exceeds 200 characters".into()));
    }
    Ok(())
}

pub fn validate_price(price_cents: i64) -> Result<(), CatalogError> {
    if price_cents < 0 {
        return Err(CatalogError::Invalid("price must not be negative".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_price() {
        let result = Package::new(Uuid::new_v4(), "Garden ceremony".into(), None, -1);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_blank_name() {
        let result = AddOn::new(Uuid::new_v4(), "   ".into(), 5000);
        assert!(result.is_err());
    }

    #[test]
    fn new_package_starts_active() {
        let package = Package::new(Uuid::new_v4(), "Terrace dinner".into(), None, 150_000).unwrap();
        assert!(package.is_active);
        assert_eq!(package.price_cents, 150_000);
    }

    #[test]
    fn partial_update_touches_only_named_fields() {
        let mut package = Package::new(Uuid::new_v4(), "Terrace dinner".into(), None, 150_000).unwrap();
        let update = PackageUpdate { is_active: Some(false), ..Default::default() };
        update.apply_to(&mut package).unwrap();
        assert!(!package.is_active);
        assert_eq!(package.name, "Terrace dinner");
        assert_eq!(package.price_cents, 150_000);
    }

    #[test]
    fn update_rejects_invalid_price() {
        let mut add_on = AddOn::new(Uuid::new_v4(), "Photographer".into(), 40_000).unwrap();
        let update = AddOnUpdate { price_cents: Some(-5), ..Default::default() };
        assert!(update.apply_to(&mut add_on).is_err());
        assert_eq!(add_on.price_cents, 40_000);
    }
}
