//! Variant axis-assignment accessor (the variant-to-value join)
//!
//! A link ties one variant to one value of one axis. The axis (`option_id`)
//! is resolved from the value inside the INSERT, so the schema's
//! one-value-per-axis constraint applies to every write path.

use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use crate::domain::{ProductVariantOptionValue, VariantSelection};
use crate::error::CatalogError;
use crate::Result;

#[derive(Debug, sqlx::FromRow)]
struct SelectionRow {
    variant_id: Uuid,
    option_id: Uuid,
    option_name: String,
    option_position: i32,
    option_value_id: Uuid,
    value: String,
}

impl SelectionRow {
    fn split(self) -> (Uuid, VariantSelection) {
        (
            self.variant_id,
            VariantSelection {
                option_id: self.option_id,
                option_name: self.option_name,
                option_position: self.option_position,
                option_value_id: self.option_value_id,
                value: self.value,
            },
        )
    }
}

/// Link a variant to an option value. Fails with `UniqueViolation` when the
/// pair already exists or when the variant already holds a value on the same
/// axis; with `ReferenceViolation` when either side is missing.
#[tracing::instrument(skip_all, fields(%variant_id, %option_value_id))]
pub async fn create(
    db: impl PgExecutor<'_>,
    variant_id: Uuid,
    option_value_id: Uuid,
) -> Result<ProductVariantOptionValue> {
    let link = sqlx::query_as::<_, ProductVariantOptionValue>(
        "INSERT INTO product_variant_option_values (variant_id, option_value_id, option_id) \
         SELECT $1, v.id, v.option_id FROM variant_option_values v WHERE v.id = $2 \
         RETURNING *",
    )
    .bind(variant_id)
    .bind(option_value_id)
    .fetch_optional(db)
    .await?;
    link.ok_or(CatalogError::ReferenceViolation {
        constraint: Some("product_variant_option_values_option_value_id_fkey".into()),
    })
}

/// Idempotent form of `create`: an existing identical link is returned as
/// is. A conflicting value on the same axis still fails.
pub async fn ensure(
    db: &mut PgConnection,
    variant_id: Uuid,
    option_value_id: Uuid,
) -> Result<ProductVariantOptionValue> {
    let inserted = sqlx::query_as::<_, ProductVariantOptionValue>(
        "INSERT INTO product_variant_option_values (variant_id, option_value_id, option_id) \
         SELECT $1, v.id, v.option_id FROM variant_option_values v WHERE v.id = $2 \
         ON CONFLICT (variant_id, option_value_id) DO NOTHING \
         RETURNING *",
    )
    .bind(variant_id)
    .bind(option_value_id)
    .fetch_optional(&mut *db)
    .await?;
    if let Some(link) = inserted {
        return Ok(link);
    }
    find(&mut *db, variant_id, option_value_id)
        .await?
        .ok_or(CatalogError::ReferenceViolation {
            constraint: Some("product_variant_option_values_option_value_id_fkey".into()),
        })
}

pub async fn find(
    db: impl PgExecutor<'_>,
    variant_id: Uuid,
    option_value_id: Uuid,
) -> Result<Option<ProductVariantOptionValue>> {
    sqlx::query_as::<_, ProductVariantOptionValue>(
        "SELECT * FROM product_variant_option_values WHERE variant_id = $1 AND option_value_id = $2",
    )
    .bind(variant_id)
    .bind(option_value_id)
    .fetch_optional(db)
    .await
    .map_err(Into::into)
}

pub async fn get(
    db: impl PgExecutor<'_>,
    variant_id: Uuid,
    option_value_id: Uuid,
) -> Result<ProductVariantOptionValue> {
    find(db, variant_id, option_value_id)
        .await?
        .ok_or(CatalogError::not_found("variant option link"))
}

pub async fn list_for_variant(
    db: impl PgExecutor<'_>,
    variant_id: Uuid,
) -> Result<Vec<ProductVariantOptionValue>> {
    sqlx::query_as::<_, ProductVariantOptionValue>(
        "SELECT * FROM product_variant_option_values WHERE variant_id = $1 ORDER BY created_at",
    )
    .bind(variant_id)
    .fetch_all(db)
    .await
    .map_err(Into::into)
}

/// A variant's choices resolved to axis and value names, in axis display
/// order.
pub async fn selections_for_variant(
    db: impl PgExecutor<'_>,
    variant_id: Uuid,
) -> Result<Vec<VariantSelection>> {
    let rows = sqlx::query_as::<_, SelectionRow>(
        "SELECT l.variant_id, o.id AS option_id, o.name AS option_name, \
                o.position AS option_position, v.id AS option_value_id, v.value \
         FROM product_variant_option_values l \
         JOIN variant_option_values v ON v.id = l.option_value_id \
         JOIN variant_options o ON o.id = l.option_id \
         WHERE l.variant_id = $1 \
         ORDER BY o.position, o.name",
    )
    .bind(variant_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|row| row.split().1).collect())
}

/// Resolved selections for every variant of a product, keyed by variant id.
pub async fn selections_for_product(
    db: impl PgExecutor<'_>,
    product_id: Uuid,
) -> Result<Vec<(Uuid, VariantSelection)>> {
    let rows = sqlx::query_as::<_, SelectionRow>(
        "SELECT l.variant_id, o.id AS option_id, o.name AS option_name, \
                o.position AS option_position, v.id AS option_value_id, v.value \
         FROM product_variant_option_values l \
         JOIN product_variants pv ON pv.id = l.variant_id \
         JOIN variant_option_values v ON v.id = l.option_value_id \
         JOIN variant_options o ON o.id = l.option_id \
         WHERE pv.product_id = $1 \
         ORDER BY l.variant_id, o.position, o.name",
    )
    .bind(product_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(SelectionRow::split).collect())
}

#[tracing::instrument(skip_all, fields(%variant_id, %option_value_id))]
pub async fn delete(
    db: impl PgExecutor<'_>,
    variant_id: Uuid,
    option_value_id: Uuid,
) -> Result<()> {
    let result = sqlx::query(
        "DELETE FROM product_variant_option_values WHERE variant_id = $1 AND option_value_id = $2",
    )
    .bind(variant_id)
    .bind(option_value_id)
    .execute(db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found("variant option link"));
    }
    Ok(())
}

pub async fn count_for_variant(db: impl PgExecutor<'_>, variant_id: Uuid) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM product_variant_option_values WHERE variant_id = $1",
    )
    .bind(variant_id)
    .fetch_one(db)
    .await
    .map_err(Into::into)
}
