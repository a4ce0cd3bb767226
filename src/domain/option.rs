//! Variant axes: options and their values
//!
//! A `VariantOption` is one dimension of variation a product offers
//! ("Color", "Size"); a `VariantOptionValue` is one choice along that
//! dimension ("Red", "M").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VariantOption {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewVariantOption {
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 0))]
    pub position: i32,
}

impl NewVariantOption {
    pub fn new(product_id: Uuid, name: impl Into<String>, position: i32) -> Self {
        Self { product_id, name: name.into(), position }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VariantOptionPatch {
    pub name: Option<String>,
    pub position: Option<i32>,
}

impl VariantOptionPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.position.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VariantOptionValue {
    pub id: Uuid,
    pub option_id: Uuid,
    pub value: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewVariantOptionValue {
    pub option_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub value: String,
    #[validate(range(min = 0))]
    pub position: i32,
}

impl NewVariantOptionValue {
    pub fn new(option_id: Uuid, value: impl Into<String>, position: i32) -> Self {
        Self { option_id, value: value.into(), position }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VariantOptionValuePatch {
    pub value: Option<String>,
    pub position: Option<i32>,
}

impl VariantOptionValuePatch {
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.position.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_validation() {
        let product_id = Uuid::now_v7();
        assert!(NewVariantOption::new(product_id, "Size", 0).validate().is_ok());
        assert!(NewVariantOption::new(product_id, "", 0).validate().is_err());
        assert!(NewVariantOption::new(product_id, "Size", -1).validate().is_err());
    }

    #[test]
    fn test_value_validation() {
        let option_id = Uuid::now_v7();
        assert!(NewVariantOptionValue::new(option_id, "M", 0).validate().is_ok());
        assert!(NewVariantOptionValue::new(option_id, "", 0).validate().is_err());
    }
}
