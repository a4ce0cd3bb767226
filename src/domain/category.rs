//! Category entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::Slug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewCategory {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub slug: Slug,
    pub is_active: bool,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, slug: Slug) -> Self {
        Self { name: name.into(), description: None, slug, is_active: true }
    }
}

/// Partial update. `None` leaves a field unchanged; for nullable columns the
/// inner `Option` distinguishes "set" from "clear".
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub slug: Option<Slug>,
    pub is_active: Option<bool>,
}

impl CategoryPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.slug.is_none() && self.is_active.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_category_defaults_active() {
        let new = NewCategory::new("Shirts", Slug::new("shirts").unwrap());
        assert!(new.is_active);
        assert!(new.validate().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let new = NewCategory::new("", Slug::new("shirts").unwrap());
        assert!(new.validate().is_err());
    }
}
