//! Order database operations

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderItem, OrderStatus, PaymentStatus};

use super::{inventory, now_millis, snowflake_id};
use crate::error::{ServiceError, ServiceResult};
use crate::orders::export::ExportRow;
use crate::orders::number::format_order_number;
use crate::orders::transitions::TransitionChange;

/// Fetch a live order scoped to the tenant. Soft-deleted and cross-tenant
/// rows both come back as `None`.
pub async fn find(
    pool: &PgPool,
    tenant_id: &str,
    order_id: i64,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NULL")
        .bind(tenant_id)
        .bind(order_id)
        .fetch_optional(pool)
        .await
}

pub async fn list(
    pool: &PgPool,
    tenant_id: &str,
    status: Option<&str>,
    limit: i32,
    offset: i32,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM orders
         WHERE tenant_id = $1 AND deleted_at IS NULL AND ($2::text IS NULL OR status = $2)
         ORDER BY created_at DESC LIMIT $3 OFFSET $4",
    )
    .bind(tenant_id)
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn list_items(pool: &PgPool, order_id: i64) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(pool)
        .await
}

/// Resolved checkout line, ready to snapshot
#[derive(Debug, Clone)]
pub struct DraftLine {
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub track_inventory: bool,
}

/// Everything needed to persist a checkout in one transaction
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: serde_json::Value,
    pub billing_address: serde_json::Value,
    pub currency: String,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub lines: Vec<DraftLine>,
}

/// Persist a checkout: re-check and decrement stock per tracked line,
/// append inventory logs, generate the order number, and insert the order
/// with its immutable item snapshots. All-or-nothing.
///
/// The order number comes from count-then-format; two concurrent checkouts
/// for one tenant can race past that window (known upstream gap, left as
/// documented behavior).
pub async fn create_checkout_order(
    pool: &PgPool,
    tenant_id: &str,
    draft: &OrderDraft,
) -> ServiceResult<Order> {
    let now = now_millis();
    let mut tx = pool.begin().await.map_err(ServiceError::from)?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE tenant_id = $1")
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(ServiceError::from)?;
    let order_number = format_order_number(count);

    for line in draft.lines.iter().filter(|l| l.track_inventory) {
        decrement_stock(&mut tx, tenant_id, line, &order_number, now).await?;
    }

    let order_id = snowflake_id();
    let order: Order = sqlx::query_as(
        r#"
        INSERT INTO orders (
            id, tenant_id, order_number, customer_name, customer_email,
            shipping_address, billing_address, currency,
            subtotal, tax, shipping, discount, total,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
        RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(tenant_id)
    .bind(&order_number)
    .bind(&draft.customer_name)
    .bind(&draft.customer_email)
    .bind(&draft.shipping_address)
    .bind(&draft.billing_address)
    .bind(&draft.currency)
    .bind(draft.subtotal)
    .bind(draft.tax)
    .bind(draft.shipping)
    .bind(draft.discount)
    .bind(draft.total)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(ServiceError::from)?;

    if !draft.lines.is_empty() {
        let ids: Vec<i64> = draft.lines.iter().map(|_| snowflake_id()).collect();
        let order_ids: Vec<i64> = draft.lines.iter().map(|_| order_id).collect();
        let product_ids: Vec<i64> = draft.lines.iter().map(|l| l.product_id).collect();
        let variant_ids: Vec<Option<i64>> = draft.lines.iter().map(|l| l.variant_id).collect();
        let names: Vec<String> = draft.lines.iter().map(|l| l.name.clone()).collect();
        let skus: Vec<String> = draft.lines.iter().map(|l| l.sku.clone()).collect();
        let prices: Vec<Decimal> = draft.lines.iter().map(|l| l.unit_price).collect();
        let quantities: Vec<i32> = draft.lines.iter().map(|l| l.quantity).collect();
        let totals: Vec<Decimal> = draft
            .lines
            .iter()
            .map(|l| l.unit_price * Decimal::from(l.quantity))
            .collect();
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, variant_id, name, sku, unit_price, quantity, total)
            SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::bigint[], $4::bigint[], $5::text[], $6::text[], $7::numeric[], $8::integer[], $9::numeric[])
            "#,
        )
        .bind(&ids)
        .bind(&order_ids)
        .bind(&product_ids)
        .bind(&variant_ids)
        .bind(&names)
        .bind(&skus)
        .bind(&prices)
        .bind(&quantities)
        .bind(&totals)
        .execute(&mut *tx)
        .await
        .map_err(ServiceError::from)?;
    }

    tx.commit().await.map_err(ServiceError::from)?;
    Ok(order)
}

/// Lock, re-check, and decrement stock for one tracked line.
async fn decrement_stock(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    line: &DraftLine,
    order_number: &str,
    now: i64,
) -> ServiceResult<()> {
    let previous: Option<i32> = match line.variant_id {
        Some(vid) => sqlx::query_scalar(
            "SELECT v.quantity FROM product_variants v
             JOIN products p ON p.id = v.product_id
             WHERE p.tenant_id = $1 AND p.id = $2 AND v.id = $3 AND p.deleted_at IS NULL
             FOR UPDATE OF v",
        )
        .bind(tenant_id)
        .bind(line.product_id)
        .bind(vid)
        .fetch_optional(&mut **tx)
        .await
        .map_err(ServiceError::from)?,
        None => sqlx::query_scalar(
            "SELECT quantity FROM products
             WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NULL
             FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(line.product_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(ServiceError::from)?,
    };

    let Some(previous) = previous else {
        return Err(ServiceError::App(AppError::new(ErrorCode::ProductNotFound)));
    };

    if previous < line.quantity {
        return Err(ServiceError::App(AppError::with_message(
            ErrorCode::InsufficientStock,
            format!(
                "Insufficient stock for {}. Available: {}, Requested: {}",
                line.name, previous, line.quantity
            ),
        )));
    }

    let new_quantity = previous - line.quantity;
    match line.variant_id {
        Some(vid) => {
            sqlx::query("UPDATE product_variants SET quantity = $1 WHERE id = $2")
                .bind(new_quantity)
                .bind(vid)
                .execute(&mut **tx)
                .await
        }
        None => {
            sqlx::query("UPDATE products SET quantity = $1, updated_at = $2 WHERE id = $3")
                .bind(new_quantity)
                .bind(now)
                .bind(line.product_id)
                .execute(&mut **tx)
                .await
        }
    }
    .map_err(ServiceError::from)?;

    inventory::log_change(
        tx,
        tenant_id,
        line.product_id,
        line.variant_id,
        previous,
        new_quantity,
        &format!("Checkout {order_number}"),
        now,
    )
    .await
    .map_err(ServiceError::from)?;

    Ok(())
}

/// Apply a planned status transition in one guarded UPDATE.
///
/// The `status = from` predicate makes the check safe under concurrent
/// updates: if another request moved the order first, no row matches and
/// the caller sees `None`.
pub async fn apply_transition(
    pool: &PgPool,
    tenant_id: &str,
    order_id: i64,
    change: &TransitionChange,
) -> Result<Option<Order>, sqlx::Error> {
    let now = now_millis();
    sqlx::query_as(
        r#"
        UPDATE orders SET
            status = $1,
            shipping_status = COALESCE($2, shipping_status),
            tracking_number = COALESCE($3, tracking_number),
            tracking_url = COALESCE($4, tracking_url),
            fulfilled_at = CASE WHEN $5 THEN $6 ELSE fulfilled_at END,
            canceled_at = CASE WHEN $7 THEN $6 ELSE canceled_at END,
            admin_notes = CASE WHEN $8::text IS NULL THEN admin_notes
                               ELSE COALESCE(admin_notes || E'\n', '') || $8 END,
            updated_at = $6
        WHERE tenant_id = $9 AND id = $10 AND deleted_at IS NULL AND status = $11
        RETURNING *
        "#,
    )
    .bind(change.to.as_db())
    .bind(change.shipping_status.map(|s| s.as_db()))
    .bind(&change.tracking_number)
    .bind(&change.tracking_url)
    .bind(change.set_fulfilled_at)
    .bind(now)
    .bind(change.set_canceled_at)
    .bind(&change.note_line)
    .bind(tenant_id)
    .bind(order_id)
    .bind(change.from.as_db())
    .fetch_optional(pool)
    .await
}

/// Update payment reconciliation fields inside an open transaction,
/// optionally moving the lifecycle status along with them.
pub async fn set_payment_result(
    tx: &mut Transaction<'_, Postgres>,
    order_id: i64,
    payment_status: PaymentStatus,
    new_status: Option<OrderStatus>,
    payment_method: Option<&str>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE orders SET payment_status = $1, status = COALESCE($2, status),
         payment_method = COALESCE($3, payment_method), updated_at = $4
         WHERE id = $5",
    )
    .bind(payment_status.as_db())
    .bind(new_status.map(|s| s.as_db()))
    .bind(payment_method)
    .bind(now)
    .bind(order_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Soft delete. Returns false when the order does not exist for this
/// tenant (or is already deleted).
pub async fn soft_delete(pool: &PgPool, tenant_id: &str, order_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET deleted_at = $1, updated_at = $1
         WHERE tenant_id = $2 AND id = $3 AND deleted_at IS NULL",
    )
    .bind(now_millis())
    .bind(tenant_id)
    .bind(order_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// All live orders for a tenant, flattened for CSV export.
pub async fn export_rows(pool: &PgPool, tenant_id: &str) -> Result<Vec<ExportRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT o.order_number, o.customer_name, o.customer_email, o.status,
               o.payment_status, o.payment_method,
               o.subtotal, o.tax, o.shipping, o.discount, o.total,
               (SELECT COUNT(*) FROM order_items i WHERE i.order_id = o.id) AS items_count,
               o.created_at
        FROM orders o
        WHERE o.tenant_id = $1 AND o.deleted_at IS NULL
        ORDER BY o.created_at DESC
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}
