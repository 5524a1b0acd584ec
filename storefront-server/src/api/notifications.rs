//! In-app notification handlers

use axum::{
    Extension,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use shared::error::{ApiResponse, AppError};

use crate::auth::tenant_auth::TenantIdentity;
use crate::db;
use crate::db::notifications::Notification;
use crate::state::AppState;

use super::{ApiResult, internal};

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<i32>,
    pub per_page: Option<i32>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Notification>> {
    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let notifications =
        db::notifications::list(&state.pool, &identity.tenant_id, per_page, offset)
            .await
            .map_err(internal)?;
    Ok(ApiResponse::success(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Path(notification_id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let updated = db::notifications::mark_read(&state.pool, &identity.tenant_id, notification_id)
        .await
        .map_err(internal)?;
    if !updated {
        return Err(AppError::not_found("Notification"));
    }
    Ok(ApiResponse::success(serde_json::json!({ "read": true })))
}
