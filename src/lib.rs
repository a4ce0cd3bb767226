//! OpenSASE Catalog
//!
//! Storage layer for the product catalog: categories, products, variant
//! axes and values, stock-carrying variants, and images, backed by
//! PostgreSQL.
//!
//! ## Features
//! - Typed accessor per entity (create/read/update/delete/upsert/aggregate)
//! - Database-enforced slugs, SKUs, compound keys and referential integrity
//! - One value per variant axis, enforced in the schema
//! - Filter combinators, multi-field ordering, offset and cursor paging
//! - Transactions with selectable isolation; server-side timeout budgets
//! - Exact decimal prices (NUMERIC), never binary floats
//!
//! ## Usage
//!
//! ```no_run
//! use opensase_catalog::{Catalog, CatalogConfig, NewCategory, Slug};
//! use opensase_catalog::store::categories;
//!
//! # async fn run() -> opensase_catalog::Result<()> {
//! let catalog = Catalog::connect(&CatalogConfig::from_env()?).await?;
//! catalog.migrate().await?;
//!
//! let shirts = categories::create(
//!     catalog.pool(),
//!     &NewCategory::new("Shirts", Slug::new("shirts")?),
//! )
//! .await?;
//!
//! let mut tx = catalog.begin().await?;
//! let found = categories::get_by_slug(tx.conn(), "shirts").await?;
//! assert_eq!(found.id, shirts.id);
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod query;
pub mod store;

pub use config::CatalogConfig;
pub use db::{Catalog, CatalogTx, IsolationLevel, TxOptions};
pub use domain::{
    Category, CategoryPatch, NewCategory, NewProduct, NewProductImage, NewProductVariant,
    NewVariantOption, NewVariantOptionValue, Product, ProductDetail, ProductImage,
    ProductImagePatch, ProductPatch, ProductVariant, ProductVariantOptionValue,
    ProductVariantPatch, Sku, Slug, VariantOption, VariantOptionPatch, VariantOptionValue,
    VariantOptionValuePatch, VariantSelection,
};
pub use error::CatalogError;
pub use query::{Cursor, Filter, Nulls, OrderBy, Page, SortOrder};

pub type Result<T> = std::result::Result<T, CatalogError>;
