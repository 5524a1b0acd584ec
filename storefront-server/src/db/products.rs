//! Product database operations

use sqlx::PgPool;

use shared::error::{AppError, ErrorCode};
use shared::models::product::{Product, ProductCreate, ProductUpdate, ProductVariant};

use super::{BoxError, now_millis, snowflake_id};
use crate::error::{ServiceError, ServiceResult};

/// Unique-violation on the tenant/sku live index
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(e) if e.code().as_deref() == Some("23505"))
}

pub async fn create(
    pool: &PgPool,
    tenant_id: &str,
    data: &ProductCreate,
) -> ServiceResult<Product> {
    let now = now_millis();
    let id = snowflake_id();
    let track_inventory = data.track_inventory.unwrap_or(true);
    let quantity = data.quantity.unwrap_or(0);
    let low_stock_threshold = data.low_stock_threshold.unwrap_or(5);

    let mut tx = pool.begin().await.map_err(ServiceError::from)?;

    let inserted = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (
            id, tenant_id, name, sku, price, category_id, brand_id,
            track_inventory, quantity, low_stock_threshold,
            is_active, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, TRUE, $11, $11)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .bind(&data.name)
    .bind(&data.sku)
    .bind(data.price)
    .bind(data.category_id)
    .bind(data.brand_id)
    .bind(track_inventory)
    .bind(quantity)
    .bind(low_stock_threshold)
    .bind(now)
    .fetch_one(&mut *tx)
    .await;

    let product = match inserted {
        Ok(p) => p,
        Err(e) if is_unique_violation(&e) => {
            return Err(ServiceError::App(AppError::new(ErrorCode::ProductSkuExists)));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(ref variants) = data.variants
        && !variants.is_empty()
    {
        let ids: Vec<i64> = variants.iter().map(|_| snowflake_id()).collect();
        let product_ids: Vec<i64> = variants.iter().map(|_| id).collect();
        let names: Vec<String> = variants.iter().map(|v| v.name.clone()).collect();
        let skus: Vec<String> = variants.iter().map(|v| v.sku.clone()).collect();
        let prices: Vec<Option<rust_decimal::Decimal>> =
            variants.iter().map(|v| v.price).collect();
        let quantities: Vec<i32> = variants.iter().map(|v| v.quantity.unwrap_or(0)).collect();
        sqlx::query(
            r#"
            INSERT INTO product_variants (id, product_id, name, sku, price, quantity)
            SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::text[], $4::text[], $5::numeric[], $6::integer[])
            "#,
        )
        .bind(&ids)
        .bind(&product_ids)
        .bind(&names)
        .bind(&skus)
        .bind(&prices)
        .bind(&quantities)
        .execute(&mut *tx)
        .await
        .map_err(ServiceError::from)?;
    }

    tx.commit().await.map_err(ServiceError::from)?;
    Ok(product)
}

/// Fetch a live product scoped to the tenant. Soft-deleted and
/// cross-tenant rows both come back as `None`.
pub async fn find(
    pool: &PgPool,
    tenant_id: &str,
    product_id: i64,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM products WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NULL",
    )
    .bind(tenant_id)
    .bind(product_id)
    .fetch_optional(pool)
    .await
}

pub async fn list(
    pool: &PgPool,
    tenant_id: &str,
    limit: i32,
    offset: i32,
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM products WHERE tenant_id = $1 AND deleted_at IS NULL
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(tenant_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn list_variants(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<ProductVariant>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, product_id, name, sku, price, quantity
         FROM product_variants WHERE product_id = $1 ORDER BY id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await
}

pub async fn find_variant(
    pool: &PgPool,
    product_id: i64,
    variant_id: i64,
) -> Result<Option<ProductVariant>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, product_id, name, sku, price, quantity
         FROM product_variants WHERE product_id = $1 AND id = $2",
    )
    .bind(product_id)
    .bind(variant_id)
    .fetch_optional(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    tenant_id: &str,
    product_id: i64,
    data: &ProductUpdate,
) -> Result<Option<Product>, BoxError> {
    let now = now_millis();
    let row: Option<Product> = sqlx::query_as(
        r#"
        UPDATE products SET
            name = COALESCE($1, name),
            price = COALESCE($2, price),
            category_id = COALESCE($3, category_id),
            brand_id = COALESCE($4, brand_id),
            track_inventory = COALESCE($5, track_inventory),
            low_stock_threshold = COALESCE($6, low_stock_threshold),
            is_active = COALESCE($7, is_active),
            updated_at = $8
        WHERE tenant_id = $9 AND id = $10 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(&data.name)
    .bind(data.price)
    .bind(data.category_id)
    .bind(data.brand_id)
    .bind(data.track_inventory)
    .bind(data.low_stock_threshold)
    .bind(data.is_active)
    .bind(now)
    .bind(tenant_id)
    .bind(product_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Soft delete. Returns false when the product does not exist for this
/// tenant (or is already deleted).
pub async fn soft_delete(
    pool: &PgPool,
    tenant_id: &str,
    product_id: i64,
) -> Result<bool, BoxError> {
    let now = now_millis();
    let result = sqlx::query(
        "UPDATE products SET deleted_at = $1, updated_at = $1
         WHERE tenant_id = $2 AND id = $3 AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(tenant_id)
    .bind(product_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
