//! Variant option (axis) accessor

use sqlx::{PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{NewVariantOption, VariantOption, VariantOptionPatch};
use crate::error::CatalogError;
use crate::Result;

#[tracing::instrument(skip_all, fields(product_id = %new.product_id, name = %new.name))]
pub async fn create(db: impl PgExecutor<'_>, new: &NewVariantOption) -> Result<VariantOption> {
    new.validate()?;
    let option = sqlx::query_as::<_, VariantOption>(
        "INSERT INTO variant_options (id, product_id, name, position) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(new.product_id)
    .bind(&new.name)
    .bind(new.position)
    .fetch_one(db)
    .await?;
    Ok(option)
}

pub async fn find(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<VariantOption>> {
    sqlx::query_as::<_, VariantOption>("SELECT * FROM variant_options WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(Into::into)
}

pub async fn get(db: impl PgExecutor<'_>, id: Uuid) -> Result<VariantOption> {
    find(db, id).await?.ok_or(CatalogError::not_found("variant option"))
}

/// Lookup by the compound key (product, name).
pub async fn find_by_name(
    db: impl PgExecutor<'_>,
    product_id: Uuid,
    name: &str,
) -> Result<Option<VariantOption>> {
    sqlx::query_as::<_, VariantOption>(
        "SELECT * FROM variant_options WHERE product_id = $1 AND name = $2",
    )
    .bind(product_id)
    .bind(name)
    .fetch_optional(db)
    .await
    .map_err(Into::into)
}

pub async fn get_by_name(db: impl PgExecutor<'_>, product_id: Uuid, name: &str) -> Result<VariantOption> {
    find_by_name(db, product_id, name)
        .await?
        .ok_or(CatalogError::not_found("variant option"))
}

/// A product's axes in display order.
pub async fn list_for_product(db: impl PgExecutor<'_>, product_id: Uuid) -> Result<Vec<VariantOption>> {
    sqlx::query_as::<_, VariantOption>(
        "SELECT * FROM variant_options WHERE product_id = $1 ORDER BY position, name",
    )
    .bind(product_id)
    .fetch_all(db)
    .await
    .map_err(Into::into)
}

#[tracing::instrument(skip_all, fields(%id))]
pub async fn update(db: impl PgExecutor<'_>, id: Uuid, patch: &VariantOptionPatch) -> Result<VariantOption> {
    if patch.is_empty() {
        return get(db, id).await;
    }
    if matches!(&patch.name, Some(name) if name.is_empty()) {
        return Err(CatalogError::Validation("option name must not be empty".into()));
    }
    if matches!(patch.position, Some(position) if position < 0) {
        return Err(CatalogError::Validation("position must not be negative".into()));
    }
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE variant_options SET updated_at = now()");
    if let Some(name) = &patch.name {
        qb.push(", name = ");
        qb.push_bind(name.clone());
    }
    if let Some(position) = patch.position {
        qb.push(", position = ");
        qb.push_bind(position);
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" RETURNING *");
    qb.build_query_as::<VariantOption>()
        .fetch_optional(db)
        .await?
        .ok_or(CatalogError::not_found("variant option"))
}

/// Deleting an axis cascades to its values and any variant links through
/// them.
#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete(db: impl PgExecutor<'_>, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM variant_options WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found("variant option"));
    }
    Ok(())
}

/// Create-or-update keyed on (product, name); updates the position.
pub async fn upsert(db: impl PgExecutor<'_>, new: &NewVariantOption) -> Result<VariantOption> {
    new.validate()?;
    let option = sqlx::query_as::<_, VariantOption>(
        "INSERT INTO variant_options (id, product_id, name, position) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (product_id, name) DO UPDATE SET \
             position = EXCLUDED.position, \
             updated_at = now() \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(new.product_id)
    .bind(&new.name)
    .bind(new.position)
    .fetch_one(db)
    .await?;
    Ok(option)
}

pub async fn count_for_product(db: impl PgExecutor<'_>, product_id: Uuid) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM variant_options WHERE product_id = $1")
        .bind(product_id)
        .fetch_one(db)
        .await
        .map_err(Into::into)
}
