//! Value objects shared across catalog entities

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::ValidationError;

use crate::error::CatalogError;

const SLUG_MAX: usize = 120;
const SKU_MAX: usize = 50;

/// URL-safe unique handle for a category or product.
///
/// Lowercase letters, digits and single dashes; never starts or ends with a
/// dash. Construction validates, so a `Slug` in hand is always well formed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Slug(String);

impl Slug {
    pub fn new(value: impl Into<String>) -> Result<Self, CatalogError> {
        let value = value.into();
        if value.is_empty() || value.len() > SLUG_MAX {
            return Err(CatalogError::Validation(format!(
                "slug must be 1 to {SLUG_MAX} characters"
            )));
        }
        let well_formed = value.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !value.starts_with('-')
            && !value.ends_with('-')
            && !value.contains("--");
        if !well_formed {
            return Err(CatalogError::Validation(format!("slug is not URL-safe: {value}")));
        }
        Ok(Self(value))
    }

    /// Derive a slug from a display name ("Summer Tees 2024" -> "summer-tees-2024").
    pub fn slugify(name: &str) -> Result<Self, CatalogError> {
        let mut out = String::with_capacity(name.len());
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                out.push(c.to_ascii_lowercase());
            } else if !out.ends_with('-') && !out.is_empty() {
                out.push('-');
            }
        }
        Self::new(out.trim_end_matches('-').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Stock-keeping unit. Trimmed and uppercased on construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, CatalogError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() {
            return Err(CatalogError::Validation("SKU is empty".into()));
        }
        if value.len() > SKU_MAX {
            return Err(CatalogError::Validation(format!("SKU exceeds {SKU_MAX} characters")));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Sku {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Monetary amounts are exact decimals and never negative.
pub fn validate_price(price: &rust_decimal::Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("price_negative"));
    }
    Ok(())
}

pub fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::new("url_scheme"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_slug_accepts_well_formed() {
        let slug = Slug::new("summer-tees-2024").unwrap();
        assert_eq!(slug.as_str(), "summer-tees-2024");
    }

    #[test]
    fn test_slug_rejects_malformed() {
        assert!(Slug::new("").is_err());
        assert!(Slug::new("Has Spaces").is_err());
        assert!(Slug::new("-leading").is_err());
        assert!(Slug::new("trailing-").is_err());
        assert!(Slug::new("double--dash").is_err());
        assert!(Slug::new("x".repeat(121)).is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(Slug::slugify("Summer Tees 2024").unwrap().as_str(), "summer-tees-2024");
        assert_eq!(Slug::slugify("  Tee / Shirt  ").unwrap().as_str(), "tee-shirt");
        assert!(Slug::slugify("???").is_err());
    }

    #[test]
    fn test_sku_normalizes() {
        let sku = Sku::new("  tee-001 ").unwrap();
        assert_eq!(sku.as_str(), "TEE-001");
        assert!(Sku::new("   ").is_err());
    }

    #[test]
    fn test_price_validation() {
        assert!(validate_price(&Decimal::new(1999, 2)).is_ok());
        assert!(validate_price(&Decimal::new(-1, 2)).is_err());
    }

    #[test]
    fn test_url_validation() {
        assert!(validate_http_url("https://cdn.example.com/a.jpg").is_ok());
        assert!(validate_http_url("ftp://files.example.com/a.jpg").is_err());
    }
}
