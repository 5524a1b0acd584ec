//! Brand database operations

use sqlx::PgPool;

use shared::error::{AppError, ErrorCode};

use super::{now_millis, snowflake_id};
use crate::error::{ServiceError, ServiceResult};

#[derive(sqlx::FromRow, serde::Serialize)]
pub struct Brand {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: i64,
    pub updated_at: i64,
}

pub async fn create(
    pool: &PgPool,
    tenant_id: &str,
    name: &str,
    slug: &str,
) -> ServiceResult<Brand> {
    let now = now_millis();
    let inserted = sqlx::query_as::<_, Brand>(
        "INSERT INTO brands (id, tenant_id, name, slug, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $5)
         RETURNING id, name, slug, created_at, updated_at",
    )
    .bind(snowflake_id())
    .bind(tenant_id)
    .bind(name)
    .bind(slug)
    .bind(now)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(b) => Ok(b),
        Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23505") => {
            Err(ServiceError::App(AppError::new(ErrorCode::BrandSlugExists)))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn list(pool: &PgPool, tenant_id: &str) -> Result<Vec<Brand>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, name, slug, created_at, updated_at
         FROM brands WHERE tenant_id = $1 AND deleted_at IS NULL ORDER BY name",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

/// Soft delete, refused while live products still reference the brand.
pub async fn soft_delete(pool: &PgPool, tenant_id: &str, brand_id: i64) -> ServiceResult<()> {
    let dependents: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM products
         WHERE tenant_id = $1 AND brand_id = $2 AND deleted_at IS NULL",
    )
    .bind(tenant_id)
    .bind(brand_id)
    .fetch_one(pool)
    .await
    .map_err(ServiceError::from)?;

    if dependents > 0 {
        return Err(ServiceError::App(
            AppError::with_message(ErrorCode::BrandHasProducts, "Brand has products")
                .with_detail("products", dependents),
        ));
    }

    let result = sqlx::query(
        "UPDATE brands SET deleted_at = $1, updated_at = $1
         WHERE tenant_id = $2 AND id = $3 AND deleted_at IS NULL",
    )
    .bind(now_millis())
    .bind(tenant_id)
    .bind(brand_id)
    .execute(pool)
    .await
    .map_err(ServiceError::from)?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::App(AppError::new(ErrorCode::BrandNotFound)));
    }
    Ok(())
}
