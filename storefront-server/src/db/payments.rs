//! Payment database operations

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use shared::models::{Payment, PaymentState};

use super::{now_millis, snowflake_id};

/// Insert a PENDING payment row for a freshly issued gateway intent.
pub async fn create_pending(
    pool: &PgPool,
    tenant_id: &str,
    order_id: i64,
    gateway_intent_id: &str,
    amount: Decimal,
    currency: &str,
) -> Result<Payment, sqlx::Error> {
    let now = now_millis();
    sqlx::query_as(
        r#"
        INSERT INTO payments (id, tenant_id, order_id, gateway_intent_id, amount, currency, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING *
        "#,
    )
    .bind(snowflake_id())
    .bind(tenant_id)
    .bind(order_id)
    .bind(gateway_intent_id)
    .bind(amount)
    .bind(currency)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find(
    pool: &PgPool,
    tenant_id: &str,
    payment_id: i64,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE tenant_id = $1 AND id = $2")
        .bind(tenant_id)
        .bind(payment_id)
        .fetch_optional(pool)
        .await
}

/// Webhook lookup by the gateway intent reference. Deliberately
/// cross-tenant: the gateway does not know our tenant ids.
pub async fn find_by_intent(
    pool: &PgPool,
    gateway_intent_id: &str,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE gateway_intent_id = $1")
        .bind(gateway_intent_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_for_order(
    pool: &PgPool,
    tenant_id: &str,
    order_id: i64,
) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM payments WHERE tenant_id = $1 AND order_id = $2 ORDER BY created_at",
    )
    .bind(tenant_id)
    .bind(order_id)
    .fetch_all(pool)
    .await
}

/// Update payment state inside an open transaction (webhook reconciliation
/// updates the payment and its order atomically).
pub async fn set_state(
    tx: &mut Transaction<'_, Postgres>,
    payment_id: i64,
    state: PaymentState,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE payments SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(state.as_db())
        .bind(now_millis())
        .bind(payment_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Record a refund inside an open transaction: accumulate the refunded
/// amount and flip the state to REFUNDED once fully refunded.
pub async fn record_refund(
    tx: &mut Transaction<'_, Postgres>,
    payment_id: i64,
    refund_amount: Decimal,
) -> Result<Payment, sqlx::Error> {
    sqlx::query_as(
        r#"
        UPDATE payments SET
            refunded_amount = refunded_amount + $1,
            status = CASE WHEN refunded_amount + $1 >= amount THEN 'REFUNDED' ELSE status END,
            updated_at = $2
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(refund_amount)
    .bind(now_millis())
    .bind(payment_id)
    .fetch_one(&mut **tx)
    .await
}
