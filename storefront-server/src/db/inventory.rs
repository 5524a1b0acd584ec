//! Inventory adjustments
//!
//! Every quantity change writes an `inventory_logs` row in the same
//! transaction, recording previous and new quantity with a reason.

use sqlx::{PgPool, Postgres, Transaction};

use shared::error::{AppError, ErrorCode};

use super::now_millis;
use crate::error::{ServiceError, ServiceResult};

/// Outcome of a manual inventory adjustment
#[derive(Debug, serde::Serialize)]
pub struct Adjustment {
    pub previous_quantity: i32,
    pub new_quantity: i32,
}

/// Append an inventory log row inside an open transaction.
pub async fn log_change(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    product_id: i64,
    variant_id: Option<i64>,
    previous_quantity: i32,
    new_quantity: i32,
    reason: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO inventory_logs (tenant_id, product_id, variant_id, previous_quantity, new_quantity, reason, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(tenant_id)
    .bind(product_id)
    .bind(variant_id)
    .bind(previous_quantity)
    .bind(new_quantity)
    .bind(reason)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Apply a manual adjustment (`delta` may be negative) to a product or
/// one of its variants, logging the change atomically.
pub async fn adjust(
    pool: &PgPool,
    tenant_id: &str,
    product_id: i64,
    variant_id: Option<i64>,
    delta: i32,
    reason: &str,
) -> ServiceResult<Adjustment> {
    let now = now_millis();
    let mut tx = pool.begin().await.map_err(ServiceError::from)?;

    let previous: Option<i32> = match variant_id {
        Some(vid) => {
            sqlx::query_scalar(
                "SELECT v.quantity FROM product_variants v
                 JOIN products p ON p.id = v.product_id
                 WHERE p.tenant_id = $1 AND p.id = $2 AND v.id = $3 AND p.deleted_at IS NULL
                 FOR UPDATE OF v",
            )
            .bind(tenant_id)
            .bind(product_id)
            .bind(vid)
            .fetch_optional(&mut *tx)
            .await
        }
        None => {
            sqlx::query_scalar(
                "SELECT quantity FROM products
                 WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NULL
                 FOR UPDATE",
            )
            .bind(tenant_id)
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await
        }
    }
    .map_err(ServiceError::from)?;

    let Some(previous) = previous else {
        let code = if variant_id.is_some() {
            ErrorCode::VariantNotFound
        } else {
            ErrorCode::ProductNotFound
        };
        return Err(ServiceError::App(AppError::new(code)));
    };

    let new_quantity = previous + delta;
    if new_quantity < 0 {
        return Err(ServiceError::App(
            AppError::new(ErrorCode::InsufficientStock)
                .with_detail("available", previous)
                .with_detail("requested", delta.abs()),
        ));
    }

    match variant_id {
        Some(vid) => {
            sqlx::query("UPDATE product_variants SET quantity = $1 WHERE id = $2")
                .bind(new_quantity)
                .bind(vid)
                .execute(&mut *tx)
                .await
        }
        None => {
            sqlx::query("UPDATE products SET quantity = $1, updated_at = $2 WHERE id = $3")
                .bind(new_quantity)
                .bind(now)
                .bind(product_id)
                .execute(&mut *tx)
                .await
        }
    }
    .map_err(ServiceError::from)?;

    log_change(
        &mut tx,
        tenant_id,
        product_id,
        variant_id,
        previous,
        new_quantity,
        reason,
        now,
    )
    .await
    .map_err(ServiceError::from)?;

    tx.commit().await.map_err(ServiceError::from)?;

    Ok(Adjustment {
        previous_quantity: previous,
        new_quantity,
    })
}

/// Recent inventory log entries for one product
#[derive(sqlx::FromRow, serde::Serialize)]
pub struct InventoryLogEntry {
    pub id: i64,
    pub variant_id: Option<i64>,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub reason: String,
    pub created_at: i64,
}

pub async fn history(
    pool: &PgPool,
    tenant_id: &str,
    product_id: i64,
    limit: i32,
) -> Result<Vec<InventoryLogEntry>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, variant_id, previous_quantity, new_quantity, reason, created_at
         FROM inventory_logs WHERE tenant_id = $1 AND product_id = $2
         ORDER BY created_at DESC LIMIT $3",
    )
    .bind(tenant_id)
    .bind(product_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
