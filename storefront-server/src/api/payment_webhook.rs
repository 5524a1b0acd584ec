//! Payment gateway webhook handler
//!
//! POST /webhooks/payment — handles gateway events (raw body for
//! signature verification). Events reconcile the Payment row and the
//! order's payment/lifecycle status together in one transaction.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use shared::models::{OrderStatus, PaymentState, PaymentStatus};

use crate::state::AppState;
use crate::{db, email, stripe};

/// Handle incoming gateway webhook events
///
/// Must receive raw body (not JSON) for HMAC signature verification.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    // 1. Get Stripe-Signature header
    let sig_header = match headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    {
        Some(s) => s,
        None => {
            tracing::warn!("Missing Stripe-Signature header");
            return StatusCode::BAD_REQUEST;
        }
    };

    // 2. Verify signature
    if let Err(e) =
        stripe::verify_webhook_signature(&body, sig_header, &state.stripe_webhook_secret)
    {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    // 3. Parse JSON event
    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse webhook JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    let event_type = event["type"].as_str().unwrap_or("");
    tracing::info!(event_type = event_type, "Received gateway webhook");

    // 4. Idempotency: INSERT first, check rows_affected (eliminates TOCTOU race)
    let event_id = match event["id"].as_str() {
        Some(id) => id,
        None => {
            tracing::warn!("Webhook event missing id");
            return StatusCode::BAD_REQUEST;
        }
    };

    let now = shared::util::now_millis();
    let insert_result = sqlx::query(
        "INSERT INTO processed_webhook_events (event_id, event_type, processed_at)
         VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
    )
    .bind(event_id)
    .bind(event_type)
    .bind(now)
    .execute(&state.pool)
    .await;

    match insert_result {
        Ok(r) if r.rows_affected() == 0 => {
            tracing::info!(event_id = event_id, "Duplicate webhook event, skipping");
            return StatusCode::OK;
        }
        Err(e) => {
            tracing::error!(%e, "DB error recording webhook event");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        Ok(_) => {} // New event, proceed
    }

    // 5. Handle event types
    match event_type {
        "payment_intent.succeeded" => handle_payment_succeeded(&state, &event).await,
        "payment_intent.payment_failed" => handle_payment_failed(&state, &event).await,
        _ => {
            tracing::debug!(event_type = event_type, "Unhandled webhook event type");
            StatusCode::OK
        }
    }
}

/// Pull the order id out of the intent metadata. A missing id is a
/// contract violation with the gateway and fails loudly.
fn order_id_from_metadata(obj: &serde_json::Value) -> Option<i64> {
    obj.get("metadata")
        .and_then(|m| m["order_id"].as_str())
        .and_then(|s| s.parse().ok())
}

/// payment_intent.succeeded → Payment PAID + order paid, atomically
async fn handle_payment_succeeded(state: &AppState, event: &serde_json::Value) -> StatusCode {
    let obj = match event.get("data").and_then(|d| d.get("object")) {
        Some(o) => o,
        None => return StatusCode::OK,
    };

    let Some(intent_id) = obj["id"].as_str() else {
        tracing::warn!("payment_intent.succeeded missing intent id");
        return StatusCode::BAD_REQUEST;
    };

    let Some(order_id) = order_id_from_metadata(obj) else {
        tracing::error!(intent_id = intent_id, "Webhook intent missing order_id metadata");
        return StatusCode::BAD_REQUEST;
    };

    let payment = match db::payments::find_by_intent(&state.pool, intent_id).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            tracing::error!(intent_id = intent_id, "No payment row for gateway intent");
            return StatusCode::OK;
        }
        Err(e) => {
            tracing::error!(%e, "DB error finding payment by intent");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    let order = match db::orders::find(&state.pool, &payment.tenant_id, order_id).await {
        Ok(Some(o)) => o,
        Ok(None) => {
            tracing::error!(order_id, "Webhook references unknown order");
            return StatusCode::OK;
        }
        Err(e) => {
            tracing::error!(%e, "DB error finding order for webhook");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    // PENDING -> PAID (or PAYMENT_FAILED -> PAID on retry); anything else
    // keeps its lifecycle status and only reconciles payment fields.
    let new_status = order
        .order_status()
        .can_transition_to(OrderStatus::Paid)
        .then_some(OrderStatus::Paid);

    let payment_method = obj["payment_method_types"]
        .as_array()
        .and_then(|a| a.first())
        .and_then(|v| v.as_str());

    let now = shared::util::now_millis();
    let mut tx = match state.pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            tracing::error!(%e, "Failed to open webhook transaction");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    let result = async {
        db::payments::set_state(&mut tx, payment.id, PaymentState::Paid).await?;
        db::orders::set_payment_result(
            &mut tx,
            order.id,
            PaymentStatus::Paid,
            new_status,
            payment_method,
            now,
        )
        .await?;
        tx.commit().await
    }
    .await;

    if let Err(e) = result {
        tracing::error!(%e, "Failed to reconcile payment success");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    tracing::info!(
        order_number = %order.order_number,
        intent_id = intent_id,
        "Payment reconciled as PAID"
    );

    let detail = serde_json::json!({ "intent_id": intent_id, "event": "payment_intent.succeeded" });
    let _ = db::audit::log(
        &state.pool,
        Some(&payment.tenant_id),
        "payment_succeeded",
        "payment",
        &payment.id.to_string(),
        Some(&detail),
        &db::audit::AuditContext {
            actor: "gateway".into(),
            ..Default::default()
        },
        now,
    )
    .await;

    StatusCode::OK
}

/// payment_intent.payment_failed → Payment FAILED + order PAYMENT_FAILED
async fn handle_payment_failed(state: &AppState, event: &serde_json::Value) -> StatusCode {
    let obj = match event.get("data").and_then(|d| d.get("object")) {
        Some(o) => o,
        None => return StatusCode::OK,
    };

    let Some(intent_id) = obj["id"].as_str() else {
        tracing::warn!("payment_intent.payment_failed missing intent id");
        return StatusCode::BAD_REQUEST;
    };

    let Some(order_id) = order_id_from_metadata(obj) else {
        tracing::error!(intent_id = intent_id, "Webhook intent missing order_id metadata");
        return StatusCode::BAD_REQUEST;
    };

    let payment = match db::payments::find_by_intent(&state.pool, intent_id).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            tracing::error!(intent_id = intent_id, "No payment row for gateway intent");
            return StatusCode::OK;
        }
        Err(e) => {
            tracing::error!(%e, "DB error finding payment by intent");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    let order = match db::orders::find(&state.pool, &payment.tenant_id, order_id).await {
        Ok(Some(o)) => o,
        Ok(None) => {
            tracing::error!(order_id, "Webhook references unknown order");
            return StatusCode::OK;
        }
        Err(e) => {
            tracing::error!(%e, "DB error finding order for webhook");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    let new_status = order
        .order_status()
        .can_transition_to(OrderStatus::PaymentFailed)
        .then_some(OrderStatus::PaymentFailed);

    let now = shared::util::now_millis();
    let mut tx = match state.pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            tracing::error!(%e, "Failed to open webhook transaction");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    let result = async {
        db::payments::set_state(&mut tx, payment.id, PaymentState::Failed).await?;
        db::orders::set_payment_result(
            &mut tx,
            order.id,
            PaymentStatus::Failed,
            new_status,
            None,
            now,
        )
        .await?;
        tx.commit().await
    }
    .await;

    if let Err(e) = result {
        tracing::error!(%e, "Failed to reconcile payment failure");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    tracing::info!(
        order_number = %order.order_number,
        intent_id = intent_id,
        "Payment reconciled as FAILED"
    );

    // Customer notification is best-effort
    let _ = email::send_payment_failed(
        &state.ses,
        &state.ses_from_email,
        &order.customer_email,
        &order.order_number,
    )
    .await;

    StatusCode::OK
}
