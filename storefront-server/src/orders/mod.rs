//! Order lifecycle services
//!
//! The transition engine is split in three: [`transitions`] plans a
//! requested change (pure), `db::orders::apply_transition` persists it in
//! one guarded UPDATE, and [`events`] dispatches the post-commit side
//! effects whose failures never unwind the committed state.

pub mod events;
pub mod export;
pub mod number;
pub mod transitions;

use shared::error::{AppError, ErrorCode};
use shared::models::Order;

use crate::db;
use crate::db::audit::AuditContext;
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;
use self::transitions::TransitionRequest;

/// Validate and apply a status transition for a tenant's order.
///
/// Missing, soft-deleted, and cross-tenant orders all surface as
/// OrderNotFound; a disallowed transition or missing tracking number is
/// rejected before anything is written.
pub async fn update_order_status(
    state: &AppState,
    tenant_id: &str,
    order_id: i64,
    req: &TransitionRequest,
    ctx: &AuditContext,
) -> ServiceResult<Order> {
    let order = db::orders::find(&state.pool, tenant_id, order_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| ServiceError::App(AppError::new(ErrorCode::OrderNotFound)))?;

    let now = shared::util::now_millis();
    let plan =
        transitions::plan_transition(order.order_status(), req, now).map_err(ServiceError::App)?;

    let updated = db::orders::apply_transition(&state.pool, tenant_id, order_id, &plan.change)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| ServiceError::App(AppError::new(ErrorCode::OrderNotFound)))?;

    // Post-commit side effects, best-effort
    events::dispatch(state, &updated, &plan.events).await;

    let changes = serde_json::json!({
        "from": plan.change.from.as_db(),
        "to": plan.change.to.as_db(),
    });
    let _ = db::audit::log(
        &state.pool,
        Some(tenant_id),
        "order_status_updated",
        "order",
        &updated.id.to_string(),
        Some(&changes),
        ctx,
        now,
    )
    .await;

    tracing::info!(
        order_number = %updated.order_number,
        from = plan.change.from.as_db(),
        to = plan.change.to.as_db(),
        "Order status updated"
    );

    Ok(updated)
}
