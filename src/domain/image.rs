//! Product images

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub url: String,
    pub alt_text: Option<String>,
    pub display_order: i32,
    /// The canonical thumbnail for the product.
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewProductImage {
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 2048), custom = "crate::domain::value_objects::validate_http_url")]
    pub url: String,
    pub alt_text: Option<String>,
    #[validate(range(min = 0))]
    pub display_order: i32,
    pub is_primary: bool,
}

impl NewProductImage {
    pub fn new(product_id: Uuid, url: impl Into<String>) -> Self {
        Self {
            product_id,
            url: url.into(),
            alt_text: None,
            display_order: 0,
            is_primary: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductImagePatch {
    pub url: Option<String>,
    pub alt_text: Option<Option<String>>,
    pub display_order: Option<i32>,
    pub is_primary: Option<bool>,
}

impl ProductImagePatch {
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.alt_text.is_none()
            && self.display_order.is_none()
            && self.is_primary.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_validation() {
        let product_id = Uuid::now_v7();
        assert!(NewProductImage::new(product_id, "https://cdn.example.com/tee.jpg").validate().is_ok());
        assert!(NewProductImage::new(product_id, "not-a-url").validate().is_err());
    }
}
