//! Order handlers
//!
//! Listing, detail, status transitions, CSV export, soft delete.

use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Order, OrderItem, OrderStatus};

use crate::auth::tenant_auth::TenantIdentity;
use crate::db;
use crate::orders::transitions::TransitionRequest;
use crate::orders::{self, export};
use crate::state::AppState;

use super::{ApiResult, audit_ctx, internal};

#[derive(Deserialize)]
pub struct OrdersQuery {
    pub page: Option<i32>,
    pub per_page: Option<i32>,
    pub status: Option<OrderStatus>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Query(query): Query<OrdersQuery>,
) -> ApiResult<Vec<Order>> {
    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let orders = db::orders::list(
        &state.pool,
        &identity.tenant_id,
        query.status.map(|s| s.as_db()),
        per_page,
        offset,
    )
    .await
    .map_err(internal)?;

    Ok(ApiResponse::success(orders))
}

#[derive(Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Path(order_id): Path<i64>,
) -> ApiResult<OrderDetail> {
    let order = db::orders::find(&state.pool, &identity.tenant_id, order_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    let items = db::orders::list_items(&state.pool, order.id)
        .await
        .map_err(internal)?;

    Ok(ApiResponse::success(OrderDetail { order, items }))
}

/// PUT /api/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    headers: HeaderMap,
    Path(order_id): Path<i64>,
    Json(req): Json<TransitionRequest>,
) -> ApiResult<Order> {
    let ctx = audit_ctx(&identity, &headers);
    let order =
        orders::update_order_status(&state, &identity.tenant_id, order_id, &req, &ctx).await?;
    Ok(ApiResponse::success(order))
}

/// GET /api/orders/export — CSV download of all live orders
pub async fn export(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
) -> Result<impl IntoResponse, AppError> {
    let rows = db::orders::export_rows(&state.pool, &identity.tenant_id)
        .await
        .map_err(internal)?;

    let csv = export::render_csv(&rows);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"orders.csv\"",
            ),
        ],
        csv,
    ))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    headers: HeaderMap,
    Path(order_id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let deleted = db::orders::soft_delete(&state.pool, &identity.tenant_id, order_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(AppError::new(ErrorCode::OrderNotFound));
    }

    let ctx = audit_ctx(&identity, &headers);
    let _ = db::audit::log(
        &state.pool,
        Some(&identity.tenant_id),
        "order_deleted",
        "order",
        &order_id.to_string(),
        None,
        &ctx,
        shared::util::now_millis(),
    )
    .await;

    Ok(ApiResponse::success(serde_json::json!({ "deleted": true })))
}
