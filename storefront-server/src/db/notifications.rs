//! In-app notification records

use sqlx::PgPool;

use super::BoxError;

#[derive(sqlx::FromRow, serde::Serialize)]
pub struct Notification {
    pub id: i64,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub order_id: Option<i64>,
    pub read: bool,
    pub created_at: i64,
}

pub async fn insert(
    pool: &PgPool,
    tenant_id: &str,
    kind: &str,
    title: &str,
    body: &str,
    order_id: Option<i64>,
    now: i64,
) -> Result<(), BoxError> {
    sqlx::query(
        "INSERT INTO notifications (tenant_id, kind, title, body, order_id, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(tenant_id)
    .bind(kind)
    .bind(title)
    .bind(body)
    .bind(order_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list(
    pool: &PgPool,
    tenant_id: &str,
    limit: i32,
    offset: i32,
) -> Result<Vec<Notification>, BoxError> {
    let rows: Vec<Notification> = sqlx::query_as(
        "SELECT id, kind, title, body, order_id, read, created_at
         FROM notifications WHERE tenant_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(tenant_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Mark one notification read. Returns false when it does not exist for
/// this tenant.
pub async fn mark_read(pool: &PgPool, tenant_id: &str, id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE tenant_id = $1 AND id = $2")
        .bind(tenant_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
