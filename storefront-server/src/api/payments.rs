//! Payment handlers
//!
//! POST /api/orders/{id}/payment-intent — issue a gateway intent
//! GET  /api/orders/{id}/payments       — payments for one order
//! POST /api/payments/{id}/refund       — full or partial refund

use axum::http::HeaderMap;
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Payment, PaymentState, PaymentStatus};

use crate::auth::tenant_auth::TenantIdentity;
use crate::db;
use crate::payments::plan_refund;
use crate::state::AppState;
use crate::{email, stripe};

use super::{ApiResult, audit_ctx, internal};

/// Create a gateway PaymentIntent for an order and persist the PENDING
/// payment row referencing it.
pub async fn create_intent(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Path(order_id): Path<i64>,
) -> ApiResult<Payment> {
    let order = db::orders::find(&state.pool, &identity.tenant_id, order_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    let intent_id = stripe::create_payment_intent(
        &state.stripe_secret_key,
        order.total,
        &order.currency,
        order.id,
        &order.order_number,
    )
    .await
    .map_err(|e| {
        tracing::error!(order_number = %order.order_number, error = %e, "Gateway intent failed");
        AppError::with_message(ErrorCode::PaymentFailed, "Payment setup failed")
    })?;

    let payment = db::payments::create_pending(
        &state.pool,
        &identity.tenant_id,
        order.id,
        &intent_id,
        order.total,
        &order.currency,
    )
    .await
    .map_err(internal)?;

    tracing::info!(
        order_number = %order.order_number,
        intent_id = %intent_id,
        "Payment intent created"
    );

    Ok(ApiResponse::success(payment))
}

pub async fn list_for_order(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Path(order_id): Path<i64>,
) -> ApiResult<Vec<Payment>> {
    // Not-found for cross-tenant orders, before exposing payment rows
    db::orders::find(&state.pool, &identity.tenant_id, order_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    let payments = db::payments::list_for_order(&state.pool, &identity.tenant_id, order_id)
        .await
        .map_err(internal)?;
    Ok(ApiResponse::success(payments))
}

#[derive(Deserialize)]
pub struct RefundRequest {
    /// Absent means refund the full remaining amount
    pub amount: Option<Decimal>,
}

pub async fn refund(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    headers: HeaderMap,
    Path(payment_id): Path<i64>,
    Json(req): Json<RefundRequest>,
) -> ApiResult<Payment> {
    let payment = db::payments::find(&state.pool, &identity.tenant_id, payment_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;

    let plan = plan_refund(&payment, req.amount)?;

    let refund_id = stripe::create_refund(
        &state.stripe_secret_key,
        &plan.intent_id,
        (!plan.is_full).then_some(plan.amount),
    )
    .await
    .map_err(|e| {
        tracing::error!(payment_id, error = %e, "Gateway refund failed");
        AppError::with_message(ErrorCode::PaymentFailed, "Gateway refund failed")
    })?;

    // Payment and order reconcile together or not at all
    let mut tx = state.pool.begin().await.map_err(internal)?;
    let updated = db::payments::record_refund(&mut tx, payment.id, plan.amount)
        .await
        .map_err(internal)?;
    if updated.state() == PaymentState::Refunded {
        db::orders::set_payment_result(
            &mut tx,
            payment.order_id,
            PaymentStatus::Refunded,
            None,
            None,
            shared::util::now_millis(),
        )
        .await
        .map_err(internal)?;
    }
    tx.commit().await.map_err(internal)?;

    // Best-effort customer email
    if let Ok(Some(order)) =
        db::orders::find(&state.pool, &identity.tenant_id, payment.order_id).await
    {
        let _ = email::send_refund_processed(
            &state.ses,
            &state.ses_from_email,
            &order.customer_email,
            &order.order_number,
            &plan.amount.to_string(),
        )
        .await;
    }

    let ctx = audit_ctx(&identity, &headers);
    let changes = serde_json::json!({
        "refund_id": refund_id,
        "amount": plan.amount.to_string(),
        "full": plan.is_full,
    });
    let _ = db::audit::log(
        &state.pool,
        Some(&identity.tenant_id),
        "payment_refunded",
        "payment",
        &payment.id.to_string(),
        Some(&changes),
        &ctx,
        shared::util::now_millis(),
    )
    .await;

    tracing::info!(payment_id, refund_id = %refund_id, amount = %plan.amount, "Refund processed");

    Ok(ApiResponse::success(updated))
}
