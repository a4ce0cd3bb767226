//! Variant option value (axis choice) accessor

use sqlx::{PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{NewVariantOptionValue, VariantOptionValue, VariantOptionValuePatch};
use crate::error::CatalogError;
use crate::Result;

#[tracing::instrument(skip_all, fields(option_id = %new.option_id, value = %new.value))]
pub async fn create(db: impl PgExecutor<'_>, new: &NewVariantOptionValue) -> Result<VariantOptionValue> {
    new.validate()?;
    let value = sqlx::query_as::<_, VariantOptionValue>(
        "INSERT INTO variant_option_values (id, option_id, value, position) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(new.option_id)
    .bind(&new.value)
    .bind(new.position)
    .fetch_one(db)
    .await?;
    Ok(value)
}

pub async fn find(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<VariantOptionValue>> {
    sqlx::query_as::<_, VariantOptionValue>("SELECT * FROM variant_option_values WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(Into::into)
}

pub async fn get(db: impl PgExecutor<'_>, id: Uuid) -> Result<VariantOptionValue> {
    find(db, id).await?.ok_or(CatalogError::not_found("option value"))
}

/// Lookup by the compound key (option, value).
pub async fn find_by_value(
    db: impl PgExecutor<'_>,
    option_id: Uuid,
    value: &str,
) -> Result<Option<VariantOptionValue>> {
    sqlx::query_as::<_, VariantOptionValue>(
        "SELECT * FROM variant_option_values WHERE option_id = $1 AND value = $2",
    )
    .bind(option_id)
    .bind(value)
    .fetch_optional(db)
    .await
    .map_err(Into::into)
}

pub async fn get_by_value(db: impl PgExecutor<'_>, option_id: Uuid, value: &str) -> Result<VariantOptionValue> {
    find_by_value(db, option_id, value)
        .await?
        .ok_or(CatalogError::not_found("option value"))
}

pub async fn list_for_option(db: impl PgExecutor<'_>, option_id: Uuid) -> Result<Vec<VariantOptionValue>> {
    sqlx::query_as::<_, VariantOptionValue>(
        "SELECT * FROM variant_option_values WHERE option_id = $1 ORDER BY position, value",
    )
    .bind(option_id)
    .fetch_all(db)
    .await
    .map_err(Into::into)
}

/// All values across a product's axes, for assembling detail views.
pub async fn list_for_product(db: impl PgExecutor<'_>, product_id: Uuid) -> Result<Vec<VariantOptionValue>> {
    sqlx::query_as::<_, VariantOptionValue>(
        "SELECT v.* FROM variant_option_values v \
         JOIN variant_options o ON o.id = v.option_id \
         WHERE o.product_id = $1 ORDER BY v.position, v.value",
    )
    .bind(product_id)
    .fetch_all(db)
    .await
    .map_err(Into::into)
}

#[tracing::instrument(skip_all, fields(%id))]
pub async fn update(db: impl PgExecutor<'_>, id: Uuid, patch: &VariantOptionValuePatch) -> Result<VariantOptionValue> {
    if patch.is_empty() {
        return get(db, id).await;
    }
    if matches!(&patch.value, Some(value) if value.is_empty()) {
        return Err(CatalogError::Validation("option value must not be empty".into()));
    }
    if matches!(patch.position, Some(position) if position < 0) {
        return Err(CatalogError::Validation("position must not be negative".into()));
    }
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE variant_option_values SET updated_at = now()");
    if let Some(value) = &patch.value {
        qb.push(", value = ");
        qb.push_bind(value.clone());
    }
    if let Some(position) = patch.position {
        qb.push(", position = ");
        qb.push_bind(position);
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" RETURNING *");
    qb.build_query_as::<VariantOptionValue>()
        .fetch_optional(db)
        .await?
        .ok_or(CatalogError::not_found("option value"))
}

#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete(db: impl PgExecutor<'_>, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM variant_option_values WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found("option value"));
    }
    Ok(())
}

/// Create-or-update keyed on (option, value); updates the position.
pub async fn upsert(db: impl PgExecutor<'_>, new: &NewVariantOptionValue) -> Result<VariantOptionValue> {
    new.validate()?;
    let value = sqlx::query_as::<_, VariantOptionValue>(
        "INSERT INTO variant_option_values (id, option_id, value, position) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (option_id, value) DO UPDATE SET \
             position = EXCLUDED.position, \
             updated_at = now() \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(new.option_id)
    .bind(&new.value)
    .bind(new.position)
    .fetch_one(db)
    .await?;
    Ok(value)
}

pub async fn count_for_option(db: impl PgExecutor<'_>, option_id: Uuid) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM variant_option_values WHERE option_id = $1")
        .bind(option_id)
        .fetch_one(db)
        .await
        .map_err(Into::into)
}
