//! Catalog domain types
//!
//! Row structs map one to one onto the persisted relations; `New*` inputs
//! validate before storage; `*Patch` structs express partial updates.

pub mod category;
pub mod image;
pub mod option;
pub mod product;
pub mod value_objects;
pub mod variant;

pub use category::{Category, CategoryPatch, NewCategory};
pub use image::{NewProductImage, ProductImage, ProductImagePatch};
pub use option::{
    NewVariantOption, NewVariantOptionValue, VariantOption, VariantOptionPatch, VariantOptionValue,
    VariantOptionValuePatch,
};
pub use product::{NewProduct, OptionWithValues, Product, ProductDetail, ProductPatch, VariantDetail};
pub use value_objects::{Sku, Slug};
pub use variant::{
    NewProductVariant, ProductVariant, ProductVariantOptionValue, ProductVariantPatch,
    VariantSelection,
};
