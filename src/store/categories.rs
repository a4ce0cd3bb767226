//! Category accessor

use sqlx::{PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Category, CategoryPatch, NewCategory};
use crate::error::CatalogError;
use crate::query::{self, Filter, OrderBy, Page, SqlColumn, SqlCond};
use crate::Result;

#[derive(Debug, Clone)]
pub enum CategoryCond {
    Active(bool),
    SlugEq(String),
    NameContains(String),
    /// At least one product references the category.
    HasProducts,
}

impl SqlCond for CategoryCond {
    fn push_cond(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            CategoryCond::Active(v) => {
                qb.push("is_active = ");
                qb.push_bind(*v);
            }
            CategoryCond::SlugEq(slug) => {
                qb.push("slug = ");
                qb.push_bind(slug.clone());
            }
            CategoryCond::NameContains(s) => {
                qb.push("name ILIKE ");
                qb.push_bind(format!("%{s}%"));
            }
            CategoryCond::HasProducts => {
                qb.push("EXISTS (SELECT 1 FROM products p WHERE p.category_id = categories.id)");
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum CategoryColumn {
    Name,
    Slug,
    CreatedAt,
    UpdatedAt,
}

impl SqlColumn for CategoryColumn {
    fn as_sql(&self) -> &'static str {
        match self {
            CategoryColumn::Name => "name",
            CategoryColumn::Slug => "slug",
            CategoryColumn::CreatedAt => "created_at",
            CategoryColumn::UpdatedAt => "updated_at",
        }
    }
}

#[tracing::instrument(skip_all, fields(slug = %new.slug))]
pub async fn create(db: impl PgExecutor<'_>, new: &NewCategory) -> Result<Category> {
    new.validate()?;
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name, description, slug, is_active) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.slug.as_str())
    .bind(new.is_active)
    .fetch_one(db)
    .await?;
    Ok(category)
}

pub async fn find(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Category>> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(Into::into)
}

pub async fn get(db: impl PgExecutor<'_>, id: Uuid) -> Result<Category> {
    find(db, id).await?.ok_or(CatalogError::not_found("category"))
}

pub async fn find_by_slug(db: impl PgExecutor<'_>, slug: &str) -> Result<Option<Category>> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE slug = $1")
        .bind(slug)
        .fetch_optional(db)
        .await
        .map_err(Into::into)
}

pub async fn get_by_slug(db: impl PgExecutor<'_>, slug: &str) -> Result<Category> {
    find_by_slug(db, slug).await?.ok_or(CatalogError::not_found("category"))
}

pub async fn list(
    db: impl PgExecutor<'_>,
    filter: &Filter<CategoryCond>,
    order: &[OrderBy<CategoryColumn>],
    page: Page,
) -> Result<Vec<Category>> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM categories WHERE ");
    filter.push(&mut qb);
    query::push_order_by(&mut qb, order, "id");
    query::push_page(&mut qb, page);
    qb.build_query_as::<Category>()
        .fetch_all(db)
        .await
        .map_err(Into::into)
}

#[tracing::instrument(skip_all, fields(%id))]
pub async fn update(db: impl PgExecutor<'_>, id: Uuid, patch: &CategoryPatch) -> Result<Category> {
    if patch.is_empty() {
        return get(db, id).await;
    }
    if matches!(&patch.name, Some(name) if name.is_empty()) {
        return Err(CatalogError::Validation("category name must not be empty".into()));
    }
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE categories SET updated_at = now()");
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
    if let Some(active) = patch.is_active {
        qb.push(", is_active = ");
        qb.push_bind(active);
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" RETURNING *");
    qb.build_query_as::<Category>()
        .fetch_optional(db)
        .await?
        .ok_or(CatalogError::not_found("category"))
}

/// Delete a category, detaching its products (their `category_id` becomes
/// NULL through the schema's SET NULL policy).
#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete(db: impl PgExecutor<'_>, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found("category"));
    }
    Ok(())
}

/// Delete a category only if no product references it; refuses with
/// `ReferenceViolation` otherwise.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete_strict(db: impl PgExecutor<'_>, id: Uuid) -> Result<()> {
    let (found, _dependents, deleted) = sqlx::query_as::<_, (i64, i64, i64)>(
        "WITH deps AS (SELECT count(*) AS c FROM products WHERE category_id = $1), \
              target AS (SELECT count(*) AS c FROM categories WHERE id = $1), \
              del AS (DELETE FROM categories WHERE id = $1 AND (SELECT c FROM deps) = 0 RETURNING id) \
         SELECT (SELECT c FROM target), (SELECT c FROM deps), (SELECT count(*) FROM del)",
    )
    .bind(id)
    .fetch_one(db)
    .await?;
    if deleted == 1 {
        return Ok(());
    }
    if found == 0 {
        return Err(CatalogError::not_found("category"));
    }
    Err(CatalogError::ReferenceViolation { constraint: Some("products_category_id_fkey".into()) })
}

pub async fn delete_where(db: impl PgExecutor<'_>, filter: &Filter<CategoryCond>) -> Result<u64> {
    let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM categories WHERE ");
    filter.push(&mut qb);
    Ok(qb.build().execute(db).await?.rows_affected())
}

/// Create-or-update keyed on the unique slug.
#[tracing::instrument(skip_all, fields(slug = %new.slug))]
pub async fn upsert_by_slug(db: impl PgExecutor<'_>, new: &NewCategory) -> Result<Category> {
    new.validate()?;
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name, description, slug, is_active) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (slug) DO UPDATE SET \
             name = EXCLUDED.name, \
             description = EXCLUDED.description, \
             is_active = EXCLUDED.is_active, \
             updated_at = now() \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.slug.as_str())
    .bind(new.is_active)
    .fetch_one(db)
    .await?;
    Ok(category)
}

pub async fn set_active_where(
    db: impl PgExecutor<'_>,
    filter: &Filter<CategoryCond>,
    active: bool,
) -> Result<u64> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE categories SET is_active = ");
    qb.push_bind(active);
    qb.push(", updated_at = now() WHERE ");
    filter.push(&mut qb);
    Ok(qb.build().execute(db).await?.rows_affected())
}

pub async fn count(db: impl PgExecutor<'_>, filter: &Filter<CategoryCond>) -> Result<i64> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM categories WHERE ");
    filter.push(&mut qb);
    qb.build_query_scalar::<i64>()
        .fetch_one(db)
        .await
        .map_err(Into::into)
}
