//! Audit log operations
//!
//! Rows are append-only. Call sites use `let _ = audit::log(...)` so a
//! failed audit write can never block the primary operation.

use sqlx::PgPool;

use super::BoxError;

/// Context captured from the request for an audit entry
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    pub actor: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Write an audit log entry
#[allow(clippy::too_many_arguments)]
pub async fn log(
    pool: &PgPool,
    tenant_id: Option<&str>,
    action: &str,
    entity_type: &str,
    entity_id: &str,
    changes: Option<&serde_json::Value>,
    ctx: &AuditContext,
    now: i64,
) -> Result<(), BoxError> {
    sqlx::query(
        "INSERT INTO audit_logs (tenant_id, action, entity_type, entity_id, changes, actor, ip_address, user_agent, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(tenant_id)
    .bind(action)
    .bind(entity_type)
    .bind(entity_id)
    .bind(changes)
    .bind(&ctx.actor)
    .bind(ctx.ip_address.as_deref())
    .bind(ctx.user_agent.as_deref())
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Query audit log entries for a tenant (paginated)
#[derive(sqlx::FromRow, serde::Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub changes: Option<serde_json::Value>,
    pub actor: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: i64,
}

pub async fn query(
    pool: &PgPool,
    tenant_id: &str,
    limit: i32,
    offset: i32,
) -> Result<Vec<AuditEntry>, BoxError> {
    let rows: Vec<AuditEntry> = sqlx::query_as(
        "SELECT id, action, entity_type, entity_id, changes, actor, ip_address, user_agent, created_at
         FROM audit_logs WHERE tenant_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(tenant_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Delete entries older than the retention window. Returns rows removed.
pub async fn purge_older_than(pool: &PgPool, retention_days: i64) -> Result<u64, BoxError> {
    let cutoff = shared::util::now_millis() - retention_days * 86_400_000;
    let result = sqlx::query("DELETE FROM audit_logs WHERE created_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
