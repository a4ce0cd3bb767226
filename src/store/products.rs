//! Product accessor

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use crate::domain::product::{OptionWithValues, ProductDetail, VariantDetail};
use crate::domain::{NewProduct, Product, ProductPatch};
use crate::error::CatalogError;
use crate::query::{self, Cursor, Filter, OrderBy, Page, SqlColumn, SqlCond};
use crate::store::{images, option_values, options, variant_links, variants};
use crate::Result;

#[derive(Debug, Clone)]
pub enum ProductCond {
    Active(bool),
    SlugEq(String),
    SkuEq(String),
    NameContains(String),
    InCategory(Uuid),
    Uncategorized,
    CreatedAfter(DateTime<Utc>),
    /// At least one variant exists, active or not.
    HasVariants,
    /// At least `n` active variants exist.
    MinActiveVariants(i64),
    HasPrimaryImage,
}

impl SqlCond for ProductCond {
    fn push_cond(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            ProductCond::Active(v) => {
                qb.push("is_active = ");
                qb.push_bind(*v);
            }
            ProductCond::SlugEq(slug) => {
                qb.push("slug = ");
                qb.push_bind(slug.clone());
            }
            ProductCond::SkuEq(sku) => {
                qb.push("sku = ");
                qb.push_bind(sku.clone());
            }
            ProductCond::NameContains(s) => {
                qb.push("name ILIKE ");
                qb.push_bind(format!("%{s}%"));
            }
            ProductCond::InCategory(id) => {
                qb.push("category_id = ");
                qb.push_bind(*id);
            }
            ProductCond::Uncategorized => {
                qb.push("category_id IS NULL");
            }
            ProductCond::CreatedAfter(at) => {
                qb.push("created_at > ");
                qb.push_bind(*at);
            }
            ProductCond::HasVariants => {
                qb.push("EXISTS (SELECT 1 FROM product_variants v WHERE v.product_id = products.id)");
            }
            ProductCond::MinActiveVariants(n) => {
                qb.push("(SELECT COUNT(*) FROM product_variants v WHERE v.product_id = products.id AND v.is_active) >= ");
                qb.push_bind(*n);
            }
            ProductCond::HasPrimaryImage => {
                qb.push("EXISTS (SELECT 1 FROM product_images i WHERE i.product_id = products.id AND i.is_primary)");
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ProductColumn {
    Name,
    Slug,
    Sku,
    CategoryId,
    CreatedAt,
    UpdatedAt,
}

impl SqlColumn for ProductColumn {
    fn as_sql(&self) -> &'static str {
        match self {
            ProductColumn::Name => "name",
            ProductColumn::Slug => "slug",
            ProductColumn::Sku => "sku",
            ProductColumn::CategoryId => "category_id",
            ProductColumn::CreatedAt => "created_at",
            ProductColumn::UpdatedAt => "updated_at",
        }
    }
}

/// Product tally per category; `category_id` is NULL for uncategorized
/// products.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryProductCount {
    pub category_id: Option<Uuid>,
    pub product_count: i64,
}

#[tracing::instrument(skip_all, fields(slug = %new.slug))]
pub async fn create(db: impl PgExecutor<'_>, new: &NewProduct) -> Result<Product> {
    new.validate()?;
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, name, description, slug, sku, category_id, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.slug.as_str())
    .bind(new.sku.as_ref().map(|s| s.as_str().to_owned()))
    .bind(new.category_id)
    .bind(new.is_active)
    .fetch_one(db)
    .await?;
    Ok(product)
}

pub async fn find(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(Into::into)
}

pub async fn get(db: impl PgExecutor<'_>, id: Uuid) -> Result<Product> {
    find(db, id).await?.ok_or(CatalogError::not_found("product"))
}

pub async fn find_by_slug(db: impl PgExecutor<'_>, slug: &str) -> Result<Option<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE slug = $1")
        .bind(slug)
        .fetch_optional(db)
        .await
        .map_err(Into::into)
}

pub async fn get_by_slug(db: impl PgExecutor<'_>, slug: &str) -> Result<Product> {
    find_by_slug(db, slug).await?.ok_or(CatalogError::not_found("product"))
}

pub async fn find_by_sku(db: impl PgExecutor<'_>, sku: &str) -> Result<Option<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE sku = $1")
        .bind(sku)
        .fetch_optional(db)
        .await
        .map_err(Into::into)
}

pub async fn get_by_sku(db: impl PgExecutor<'_>, sku: &str) -> Result<Product> {
    find_by_sku(db, sku).await?.ok_or(CatalogError::not_found("product"))
}

pub async fn list(
    db: impl PgExecutor<'_>,
    filter: &Filter<ProductCond>,
    order: &[OrderBy<ProductColumn>],
    page: Page,
) -> Result<Vec<Product>> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM products WHERE ");
    filter.push(&mut qb);
    query::push_order_by(&mut qb, order, "id");
    query::push_page(&mut qb, page);
    qb.build_query_as::<Product>()
        .fetch_all(db)
        .await
        .map_err(Into::into)
}

/// Keyset page anchored on a product id. A positive take returns the rows
/// created after the anchor, a negative take the rows before it; pages come
/// back in ascending creation order either way.
pub async fn page_by_cursor(
    db: &mut PgConnection,
    filter: &Filter<ProductCond>,
    cursor: Cursor,
) -> Result<Vec<Product>> {
    let anchor = sqlx::query_as::<_, (DateTime<Utc>, Uuid)>(
        "SELECT created_at, id FROM products WHERE id = $1",
    )
    .bind(cursor.anchor)
    .fetch_optional(&mut *db)
    .await?
    .ok_or(CatalogError::not_found("cursor anchor"))?;

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM products WHERE (");
    filter.push(&mut qb);
    qb.push(") AND (created_at, id) ");
    qb.push(if cursor.forward() { "> (" } else { "< (" });
    qb.push_bind(anchor.0);
    qb.push(", ");
    qb.push_bind(anchor.1);
    qb.push(")");
    let dir = if cursor.forward() { "ASC" } else { "DESC" };
    qb.push(" ORDER BY created_at ");
    qb.push(dir);
    qb.push(", id ");
    qb.push(dir);
    qb.push(" LIMIT ");
    qb.push_bind(cursor.limit());

    let mut rows = qb.build_query_as::<Product>().fetch_all(&mut *db).await?;
    if !cursor.forward() {
        rows.reverse();
    }
    Ok(rows)
}

#[tracing::instrument(skip_all, fields(%id))]
pub async fn update(db: impl PgExecutor<'_>, id: Uuid, patch: &ProductPatch) -> Result<Product> {
    if patch.is_empty() {
        return get(db, id).await;
    }
    if matches!(&patch.name, Some(name) if name.is_empty()) {
        return Err(CatalogError::Validation("product name must not be empty".into()));
    }
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE products SET updated_at = now()");
    if let Some(name) = &patch.name {
        qb.push(", name = ");
        qb.push_bind(name.clone());
    }
    if let Some(description) = &patch.description {
        qb.push(", description = ");
        qb.push_bind(description.clone());
    }
    if let Some(slug) = &patch.slug {
        qb.push(", slug = ");
        qb.push_bind(slug.as_str().to_owned());
    }
    if let Some(sku) = &patch.sku {
        qb.push(", sku = ");
        qb.push_bind(sku.as_ref().map(|s| s.as_str().to_owned()));
    }
    if let Some(category_id) = &patch.category_id {
        qb.push(", category_id = ");
        qb.push_bind(*category_id);
    }
    if let Some(active) = patch.is_active {
        qb.push(", is_active = ");
        qb.push_bind(active);
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" RETURNING *");
    qb.build_query_as::<Product>()
        .fetch_optional(db)
        .await?
        .ok_or(CatalogError::not_found("product"))
}

/// Delete a product. The schema cascades to its variants, options, values,
/// images and axis links.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete(db: impl PgExecutor<'_>, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found("product"));
    }
    Ok(())
}

pub async fn delete_where(db: impl PgExecutor<'_>, filter: &Filter<ProductCond>) -> Result<u64> {
    let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM products WHERE ");
    filter.push(&mut qb);
    Ok(qb.build().execute(db).await?.rows_affected())
}

/// Create-or-update keyed on the unique slug.
#[tracing::instrument(skip_all, fields(slug = %new.slug))]
pub async fn upsert_by_slug(db: impl PgExecutor<'_>, new: &NewProduct) -> Result<Product> {
    new.validate()?;
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, name, description, slug, sku, category_id, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (slug) DO UPDATE SET \
             name = EXCLUDED.name, \
             description = EXCLUDED.description, \
             sku = EXCLUDED.sku, \
             category_id = EXCLUDED.category_id, \
             is_active = EXCLUDED.is_active, \
             updated_at = now() \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.slug.as_str())
    .bind(new.sku.as_ref().map(|s| s.as_str().to_owned()))
    .bind(new.category_id)
    .bind(new.is_active)
    .fetch_one(db)
    .await?;
    Ok(product)
}

pub async fn set_active_where(
    db: impl PgExecutor<'_>,
    filter: &Filter<ProductCond>,
    active: bool,
) -> Result<u64> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE products SET is_active = ");
    qb.push_bind(active);
    qb.push(", updated_at = now() WHERE ");
    filter.push(&mut qb);
    Ok(qb.build().execute(db).await?.rows_affected())
}

pub async fn count(db: impl PgExecutor<'_>, filter: &Filter<ProductCond>) -> Result<i64> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE ");
    filter.push(&mut qb);
    qb.build_query_scalar::<i64>()
        .fetch_one(db)
        .await
        .map_err(Into::into)
}

/// Products per category. `min_count` is a post-grouping threshold on the
/// grouped tally.
pub async fn count_by_category(
    db: impl PgExecutor<'_>,
    min_count: Option<i64>,
) -> Result<Vec<CategoryProductCount>> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT category_id, COUNT(*) AS product_count FROM products GROUP BY category_id",
    );
    if let Some(min) = min_count {
        qb.push(" HAVING COUNT(*) >= ");
        qb.push_bind(min);
    }
    qb.push(" ORDER BY product_count DESC, category_id ASC NULLS LAST");
    qb.build_query_as::<CategoryProductCount>()
        .fetch_all(db)
        .await
        .map_err(Into::into)
}

/// The product with its axes, variants (including resolved selections) and
/// images. Run inside a transaction when a torn read matters.
pub async fn detail(db: &mut PgConnection, id: Uuid) -> Result<ProductDetail> {
    let product = get(&mut *db, id).await?;
    let option_rows = options::list_for_product(&mut *db, id).await?;
    let value_rows = option_values::list_for_product(&mut *db, id).await?;
    let variant_rows = variants::list_for_product(&mut *db, id).await?;
    let mut selections = variant_links::selections_for_product(&mut *db, id).await?;
    let images = images::list_for_product(&mut *db, id).await?;

    let options = option_rows
        .into_iter()
        .map(|option| {
            let values = value_rows
                .iter()
                .filter(|v| v.option_id == option.id)
                .cloned()
                .collect();
            OptionWithValues { option, values }
        })
        .collect();

    let variants = variant_rows
        .into_iter()
        .map(|variant| {
            let mut picked = Vec::new();
            selections.retain(|(variant_id, selection)| {
                if *variant_id == variant.id {
                    picked.push(selection.clone());
                    false
                } else {
                    true
                }
            });
            VariantDetail { variant, selections: picked }
        })
        .collect();

    Ok(ProductDetail { product, options, variants, images })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Execute;

    fn render(filter: &Filter<ProductCond>) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("");
        filter.push(&mut qb);
        qb.build().sql().to_string()
    }

    #[test]
    fn test_relationship_conditions_render_subqueries() {
        let sql = render(&Filter::from(ProductCond::MinActiveVariants(1)));
        assert!(sql.contains("SELECT COUNT(*) FROM product_variants"));
        assert!(sql.ends_with(">= $1"));

        let sql = render(&Filter::from(ProductCond::HasPrimaryImage));
        assert!(sql.contains("EXISTS"));
        assert!(sql.contains("i.is_primary"));
    }

    #[test]
    fn test_category_and_active_variant_filter() {
        let category_id = Uuid::now_v7();
        let filter = Filter::all([
            Filter::from(ProductCond::InCategory(category_id)),
            Filter::from(ProductCond::MinActiveVariants(1)),
        ]);
        let sql = render(&filter);
        assert_eq!(
            sql,
            "(category_id = $1 AND (SELECT COUNT(*) FROM product_variants v WHERE v.product_id = products.id AND v.is_active) >= $2)"
        );
    }

    #[test]
    fn test_uncategorized_renders_is_null() {
        assert_eq!(render(&Filter::from(ProductCond::Uncategorized)), "category_id IS NULL");
    }
}
