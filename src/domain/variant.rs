//! Product variants and their axis assignments

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::Sku;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    /// Exact decimal; monetary values never pass through binary floats.
    pub price: Decimal,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductVariant {
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewProductVariant {
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub sku: Option<Sku>,
    #[validate(custom = "crate::domain::value_objects::validate_price")]
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub stock: i32,
    pub is_active: bool,
}

impl NewProductVariant {
    pub fn new(product_id: Uuid, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            product_id,
            name: name.into(),
            sku: None,
            price,
            stock: 0,
            is_active: true,
        }
    }

    pub fn with_sku(mut self, sku: Sku) -> Self {
        self.sku = Some(sku);
        self
    }

    pub fn with_stock(mut self, stock: i32) -> Self {
        self.stock = stock;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductVariantPatch {
    pub name: Option<String>,
    pub sku: Option<Option<Sku>>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

impl ProductVariantPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sku.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.is_active.is_none()
    }
}

/// Join row linking a variant to one value of one axis. `option_id` is
/// derived from the value's parent option when the link is created, which is
/// what keeps a variant to a single value per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductVariantOptionValue {
    pub variant_id: Uuid,
    pub option_value_id: Uuid,
    pub option_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A variant's resolved choice on one axis ("Color" -> "Red").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VariantSelection {
    pub option_id: Uuid,
    pub option_name: String,
    pub option_position: i32,
    pub option_value_id: Uuid,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_validation() {
        let product_id = Uuid::now_v7();
        let new = NewProductVariant::new(product_id, "Tee-M", Decimal::new(1999, 2)).with_stock(10);
        assert!(new.validate().is_ok());

        let negative_stock = NewProductVariant::new(product_id, "Tee-M", Decimal::new(1999, 2)).with_stock(-1);
        assert!(negative_stock.validate().is_err());

        let negative_price = NewProductVariant::new(product_id, "Tee-M", Decimal::new(-1999, 2));
        assert!(negative_price.validate().is_err());
    }

    #[test]
    fn test_in_stock() {
        let now = Utc::now();
        let variant = ProductVariant {
            id: Uuid::now_v7(),
            product_id: Uuid::now_v7(),
            name: "Tee-M".into(),
            sku: None,
            price: Decimal::new(1999, 2),
            stock: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert!(!variant.is_in_stock());
    }
}
