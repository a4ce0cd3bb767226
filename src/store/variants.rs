//! Product variant accessor

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{NewProductVariant, ProductVariant, ProductVariantPatch};
use crate::error::CatalogError;
use crate::query::{self, Cursor, Filter, OrderBy, Page, SqlColumn, SqlCond};
use crate::Result;

#[derive(Debug, Clone)]
pub enum VariantCond {
    OfProduct(Uuid),
    Active(bool),
    SkuEq(String),
    InStock,
    StockAtMost(i32),
    PriceAtLeast(Decimal),
    PriceAtMost(Decimal),
}

impl SqlCond for VariantCond {
    fn push_cond(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            VariantCond::OfProduct(id) => {
                qb.push("product_id = ");
                qb.push_bind(*id);
            }
            VariantCond::Active(v) => {
                qb.push("is_active = ");
                qb.push_bind(*v);
            }
            VariantCond::SkuEq(sku) => {
                qb.push("sku = ");
                qb.push_bind(sku.clone());
            }
            VariantCond::InStock => {
                qb.push("stock > 0");
            }
            VariantCond::StockAtMost(n) => {
                qb.push("stock <= ");
                qb.push_bind(*n);
            }
            VariantCond::PriceAtLeast(p) => {
                qb.push("price >= ");
                qb.push_bind(*p);
            }
            VariantCond::PriceAtMost(p) => {
                qb.push("price <= ");
                qb.push_bind(*p);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum VariantColumn {
    Name,
    Sku,
    Price,
    Stock,
    CreatedAt,
}

impl SqlColumn for VariantColumn {
    fn as_sql(&self) -> &'static str {
        match self {
            VariantColumn::Name => "name",
            VariantColumn::Sku => "sku",
            VariantColumn::Price => "price",
            VariantColumn::Stock => "stock",
            VariantColumn::CreatedAt => "created_at",
        }
    }
}

/// Price spread and variant tally for one product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PriceStats {
    pub variant_count: i64,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

/// Stock totals per product, for replenishment views.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductStockTotal {
    pub product_id: Uuid,
    pub variant_count: i64,
    pub total_stock: i64,
}

#[tracing::instrument(skip_all, fields(product_id = %new.product_id, name = %new.name))]
pub async fn create(db: impl PgExecutor<'_>, new: &NewProductVariant) -> Result<ProductVariant> {
    new.validate()?;
    let variant = sqlx::query_as::<_, ProductVariant>(
        "INSERT INTO product_variants (id, product_id, name, sku, price, stock, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(new.product_id)
    .bind(&new.name)
    .bind(new.sku.as_ref().map(|s| s.as_str().to_owned()))
    .bind(new.price)
    .bind(new.stock)
    .bind(new.is_active)
    .fetch_one(db)
    .await?;
    Ok(variant)
}

pub async fn find(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<ProductVariant>> {
    sqlx::query_as::<_, ProductVariant>("SELECT * FROM product_variants WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(Into::into)
}

pub async fn get(db: impl PgExecutor<'_>, id: Uuid) -> Result<ProductVariant> {
    find(db, id).await?.ok_or(CatalogError::not_found("product variant"))
}

pub async fn find_by_sku(db: impl PgExecutor<'_>, sku: &str) -> Result<Option<ProductVariant>> {
    sqlx::query_as::<_, ProductVariant>("SELECT * FROM product_variants WHERE sku = $1")
        .bind(sku)
        .fetch_optional(db)
        .await
        .map_err(Into::into)
}

pub async fn get_by_sku(db: impl PgExecutor<'_>, sku: &str) -> Result<ProductVariant> {
    find_by_sku(db, sku).await?.ok_or(CatalogError::not_found("product variant"))
}

pub async fn list(
    db: impl PgExecutor<'_>,
    filter: &Filter<VariantCond>,
    order: &[OrderBy<VariantColumn>],
    page: Page,
) -> Result<Vec<ProductVariant>> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM product_variants WHERE ");
    filter.push(&mut qb);
    query::push_order_by(&mut qb, order, "id");
    query::push_page(&mut qb, page);
    qb.build_query_as::<ProductVariant>()
        .fetch_all(db)
        .await
        .map_err(Into::into)
}

pub async fn list_for_product(db: impl PgExecutor<'_>, product_id: Uuid) -> Result<Vec<ProductVariant>> {
    sqlx::query_as::<_, ProductVariant>(
        "SELECT * FROM product_variants WHERE product_id = $1 ORDER BY created_at, id",
    )
    .bind(product_id)
    .fetch_all(db)
    .await
    .map_err(Into::into)
}

/// Keyset page over variants; same contract as the product cursor.
pub async fn page_by_cursor(
    db: &mut PgConnection,
    filter: &Filter<VariantCond>,
    cursor: Cursor,
) -> Result<Vec<ProductVariant>> {
    let anchor = sqlx::query_as::<_, (DateTime<Utc>, Uuid)>(
        "SELECT created_at, id FROM product_variants WHERE id = $1",
    )
    .bind(cursor.anchor)
    .fetch_optional(&mut *db)
    .await?
    .ok_or(CatalogError::not_found("cursor anchor"))?;

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM product_variants WHERE (");
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

    let mut rows = qb.build_query_as::<ProductVariant>().fetch_all(&mut *db).await?;
    if !cursor.forward() {
        rows.reverse();
    }
    Ok(rows)
}

#[tracing::instrument(skip_all, fields(%id))]
pub async fn update(db: impl PgExecutor<'_>, id: Uuid, patch: &ProductVariantPatch) -> Result<ProductVariant> {
    if patch.is_empty() {
        return get(db, id).await;
    }
    if matches!(&patch.name, Some(name) if name.is_empty()) {
        return Err(CatalogError::Validation("variant name must not be empty".into()));
    }
    if matches!(patch.price, Some(price) if price.is_sign_negative()) {
        return Err(CatalogError::Validation("price must not be negative".into()));
    }
    if matches!(patch.stock, Some(stock) if stock < 0) {
        return Err(CatalogError::Validation("stock must not be negative".into()));
    }
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE product_variants SET updated_at = now()");
    if let Some(name) = &patch.name {
        qb.push(", name = ");
        qb.push_bind(name.clone());
    }
    if let Some(sku) = &patch.sku {
        qb.push(", sku = ");
        qb.push_bind(sku.as_ref().map(|s| s.as_str().to_owned()));
    }
    if let Some(price) = patch.price {
        qb.push(", price = ");
        qb.push_bind(price);
    }
    if let Some(stock) = patch.stock {
        qb.push(", stock = ");
        qb.push_bind(stock);
    }
    if let Some(active) = patch.is_active {
        qb.push(", is_active = ");
        qb.push_bind(active);
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" RETURNING *");
    qb.build_query_as::<ProductVariant>()
        .fetch_optional(db)
        .await?
        .ok_or(CatalogError::not_found("product variant"))
}

/// Relative stock movement, guarded in the statement itself so a concurrent
/// writer can never drive stock below zero. Run inside a serializable
/// transaction when the movement depends on an earlier read.
#[tracing::instrument(skip_all, fields(%id, delta))]
pub async fn adjust_stock(db: &mut PgConnection, id: Uuid, delta: i32) -> Result<ProductVariant> {
    let updated = sqlx::query_as::<_, ProductVariant>(
        "UPDATE product_variants SET stock = stock + $2, updated_at = now() \
         WHERE id = $1 AND stock + $2 >= 0 RETURNING *",
    )
    .bind(id)
    .bind(delta)
    .fetch_optional(&mut *db)
    .await?;
    match updated {
        Some(variant) => Ok(variant),
        None => {
            // Classify the miss: unknown variant or insufficient stock.
            match find(&mut *db, id).await? {
                Some(_) => Err(CatalogError::Validation("insufficient stock".into())),
                None => Err(CatalogError::not_found("product variant")),
            }
        }
    }
}

#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete(db: impl PgExecutor<'_>, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM product_variants WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found("product variant"));
    }
    Ok(())
}

pub async fn delete_where(db: impl PgExecutor<'_>, filter: &Filter<VariantCond>) -> Result<u64> {
    let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM product_variants WHERE ");
    filter.push(&mut qb);
    Ok(qb.build().execute(db).await?.rows_affected())
}

/// Create-or-update keyed on the unique SKU; the input must carry one.
#[tracing::instrument(skip_all, fields(product_id = %new.product_id))]
pub async fn upsert_by_sku(db: impl PgExecutor<'_>, new: &NewProductVariant) -> Result<ProductVariant> {
    new.validate()?;
    let Some(sku) = &new.sku else {
        return Err(CatalogError::Validation("upsert requires a SKU".into()));
    };
    let variant = sqlx::query_as::<_, ProductVariant>(
        "INSERT INTO product_variants (id, product_id, name, sku, price, stock, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (sku) DO UPDATE SET \
             name = EXCLUDED.name, \
             price = EXCLUDED.price, \
             stock = EXCLUDED.stock, \
             is_active = EXCLUDED.is_active, \
             updated_at = now() \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(new.product_id)
    .bind(&new.name)
    .bind(sku.as_str())
    .bind(new.price)
    .bind(new.stock)
    .bind(new.is_active)
    .fetch_one(db)
    .await?;
    Ok(variant)
}

pub async fn set_active_where(
    db: impl PgExecutor<'_>,
    filter: &Filter<VariantCond>,
    active: bool,
) -> Result<u64> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE product_variants SET is_active = ");
    qb.push_bind(active);
    qb.push(", updated_at = now() WHERE ");
    filter.push(&mut qb);
    Ok(qb.build().execute(db).await?.rows_affected())
}

pub async fn count(db: impl PgExecutor<'_>, filter: &Filter<VariantCond>) -> Result<i64> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM product_variants WHERE ");
    filter.push(&mut qb);
    qb.build_query_scalar::<i64>()
        .fetch_one(db)
        .await
        .map_err(Into::into)
}

/// Count and min/max price over one product's variants.
pub async fn price_stats(db: impl PgExecutor<'_>, product_id: Uuid, active_only: bool) -> Result<PriceStats> {
    sqlx::query_as::<_, PriceStats>(
        "SELECT COUNT(*) AS variant_count, MIN(price) AS min_price, MAX(price) AS max_price \
         FROM product_variants WHERE product_id = $1 AND (NOT $2 OR is_active)",
    )
    .bind(product_id)
    .bind(active_only)
    .fetch_one(db)
    .await
    .map_err(Into::into)
}

/// Stock totals grouped by product. `min_total` is a post-grouping
/// threshold on the summed stock.
pub async fn stock_by_product(
    db: impl PgExecutor<'_>,
    min_total: Option<i64>,
) -> Result<Vec<ProductStockTotal>> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT product_id, COUNT(*) AS variant_count, COALESCE(SUM(stock), 0)::bigint AS total_stock \
         FROM product_variants GROUP BY product_id",
    );
    if let Some(min) = min_total {
        qb.push(" HAVING COALESCE(SUM(stock), 0) >= ");
        qb.push_bind(min);
    }
    qb.push(" ORDER BY total_stock ASC, product_id ASC");
    qb.build_query_as::<ProductStockTotal>()
        .fetch_all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Execute;

    fn render(filter: &Filter<VariantCond>) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("");
        filter.push(&mut qb);
        qb.build().sql().to_string()
    }

    #[test]
    fn test_price_band_filter() {
        let filter = Filter::all([
            Filter::from(VariantCond::PriceAtLeast(Decimal::new(1000, 2))),
            Filter::from(VariantCond::PriceAtMost(Decimal::new(5000, 2))),
            Filter::from(VariantCond::InStock),
        ]);
        assert_eq!(render(&filter), "(price >= $1 AND price <= $2 AND stock > 0)");
    }

    #[test]
    fn test_negation_renders_not() {
        let filter = Filter::not(Filter::from(VariantCond::Active(true)));
        assert_eq!(render(&filter), "NOT (is_active = $1)");
    }
}
