//! Product entity and the composite detail view

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::image::ProductImage;
use crate::domain::option::{VariantOption, VariantOptionValue};
use crate::domain::value_objects::{Sku, Slug};
use crate::domain::variant::{ProductVariant, VariantSelection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub sku: Option<String>,
    pub category_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_uncategorized(&self) -> bool {
        self.category_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub slug: Slug,
    pub sku: Option<Sku>,
    pub category_id: Option<Uuid>,
    pub is_active: bool,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, slug: Slug) -> Self {
        Self {
            name: name.into(),
            description: None,
            slug,
            sku: None,
            category_id: None,
            is_active: true,
        }
    }

    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_sku(mut self, sku: Sku) -> Self {
        self.sku = Some(sku);
        self
    }
}

/// Partial update. Moving a product between categories goes through
/// `category_id`; there is no object-graph mutation.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub slug: Option<Slug>,
    pub sku: Option<Option<Sku>>,
    pub category_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.slug.is_none()
            && self.sku.is_none()
            && self.category_id.is_none()
            && self.is_active.is_none()
    }
}

/// A product with its axes, variants and images resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    pub options: Vec<OptionWithValues>,
    pub variants: Vec<VariantDetail>,
    pub images: Vec<ProductImage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionWithValues {
    pub option: VariantOption,
    pub values: Vec<VariantOptionValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantDetail {
    pub variant: ProductVariant,
    /// One entry per axis the variant participates in.
    pub selections: Vec<VariantSelection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_builders() {
        let category_id = Uuid::now_v7();
        let new = NewProduct::new("Tee", Slug::new("tee").unwrap())
            .in_category(category_id)
            .with_sku(Sku::new("TEE-001").unwrap());
        assert_eq!(new.category_id, Some(category_id));
        assert!(new.validate().is_ok());
    }

    #[test]
    fn test_patch_emptiness() {
        assert!(ProductPatch::default().is_empty());
        let patch = ProductPatch { category_id: Some(None), ..Default::default() };
        assert!(!patch.is_empty());
    }
}
