//! Product image accessor

use sqlx::{PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{NewProductImage, ProductImage, ProductImagePatch};
use crate::error::CatalogError;
use crate::query::{Filter, SqlCond};
use crate::Result;

#[derive(Debug, Clone)]
pub enum ImageCond {
    OfProduct(Uuid),
    Primary(bool),
}

impl SqlCond for ImageCond {
    fn push_cond(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            ImageCond::OfProduct(id) => {
                qb.push("product_id = ");
                qb.push_bind(*id);
            }
            ImageCond::Primary(v) => {
                qb.push("is_primary = ");
                qb.push_bind(*v);
            }
        }
    }
}

#[tracing::instrument(skip_all, fields(product_id = %new.product_id))]
pub async fn create(db: impl PgExecutor<'_>, new: &NewProductImage) -> Result<ProductImage> {
    new.validate()?;
    let image = sqlx::query_as::<_, ProductImage>(
        "INSERT INTO product_images (id, product_id, url, alt_text, display_order, is_primary) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(new.product_id)
    .bind(&new.url)
    .bind(&new.alt_text)
    .bind(new.display_order)
    .bind(new.is_primary)
    .fetch_one(db)
    .await?;
    Ok(image)
}

pub async fn find(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<ProductImage>> {
    sqlx::query_as::<_, ProductImage>("SELECT * FROM product_images WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(Into::into)
}

pub async fn get(db: impl PgExecutor<'_>, id: Uuid) -> Result<ProductImage> {
    find(db, id).await?.ok_or(CatalogError::not_found("product image"))
}

/// A product's images: primary first, then display order.
pub async fn list_for_product(db: impl PgExecutor<'_>, product_id: Uuid) -> Result<Vec<ProductImage>> {
    sqlx::query_as::<_, ProductImage>(
        "SELECT * FROM product_images WHERE product_id = $1 \
         ORDER BY is_primary DESC, display_order, created_at",
    )
    .bind(product_id)
    .fetch_all(db)
    .await
    .map_err(Into::into)
}

#[tracing::instrument(skip_all, fields(%id))]
pub async fn update(db: impl PgExecutor<'_>, id: Uuid, patch: &ProductImagePatch) -> Result<ProductImage> {
    if patch.is_empty() {
        return get(db, id).await;
    }
    if matches!(&patch.url, Some(url) if url.is_empty()) {
        return Err(CatalogError::Validation("image url must not be empty".into()));
    }
    if matches!(patch.display_order, Some(order) if order < 0) {
        return Err(CatalogError::Validation("display order must not be negative".into()));
    }
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE product_images SET updated_at = now()");
    if let Some(url) = &patch.url {
        qb.push(", url = ");
        qb.push_bind(url.clone());
    }
    if let Some(alt_text) = &patch.alt_text {
        qb.push(", alt_text = ");
        qb.push_bind(alt_text.clone());
    }
    if let Some(order) = patch.display_order {
        qb.push(", display_order = ");
        qb.push_bind(order);
    }
    if let Some(primary) = patch.is_primary {
        qb.push(", is_primary = ");
        qb.push_bind(primary);
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" RETURNING *");
    qb.build_query_as::<ProductImage>()
        .fetch_optional(db)
        .await?
        .ok_or(CatalogError::not_found("product image"))
}

/// Make one image the canonical thumbnail and clear the flag on its
/// siblings, in a single statement.
#[tracing::instrument(skip_all, fields(%product_id, %image_id))]
pub async fn set_primary(db: impl PgExecutor<'_>, product_id: Uuid, image_id: Uuid) -> Result<()> {
    let touched = sqlx::query_scalar::<_, Uuid>(
        "UPDATE product_images SET is_primary = (id = $2), updated_at = now() \
         WHERE product_id = $1 RETURNING id",
    )
    .bind(product_id)
    .bind(image_id)
    .fetch_all(db)
    .await?;
    if !touched.contains(&image_id) {
        return Err(CatalogError::not_found("product image"));
    }
    Ok(())
}

#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete(db: impl PgExecutor<'_>, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM product_images WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found("product image"));
    }
    Ok(())
}

pub async fn delete_where(db: impl PgExecutor<'_>, filter: &Filter<ImageCond>) -> Result<u64> {
    let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM product_images WHERE ");
    filter.push(&mut qb);
    Ok(qb.build().execute(db).await?.rows_affected())
}

/// Create-or-update keyed on the image id, for callers that manage their own
/// identifiers.
pub async fn upsert(db: impl PgExecutor<'_>, id: Uuid, new: &NewProductImage) -> Result<ProductImage> {
    new.validate()?;
    let image = sqlx::query_as::<_, ProductImage>(
        "INSERT INTO product_images (id, product_id, url, alt_text, display_order, is_primary) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (id) DO UPDATE SET \
             url = EXCLUDED.url, \
             alt_text = EXCLUDED.alt_text, \
             display_order = EXCLUDED.display_order, \
             is_primary = EXCLUDED.is_primary, \
             updated_at = now() \
         RETURNING *",
    )
    .bind(id)
    .bind(new.product_id)
    .bind(&new.url)
    .bind(&new.alt_text)
    .bind(new.display_order)
    .bind(new.is_primary)
    .fetch_one(db)
    .await?;
    Ok(image)
}

pub async fn count(db: impl PgExecutor<'_>, filter: &Filter<ImageCond>) -> Result<i64> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM product_images WHERE ");
    filter.push(&mut qb);
    qb.build_query_scalar::<i64>()
        .fetch_one(db)
        .await
        .map_err(Into::into)
}
