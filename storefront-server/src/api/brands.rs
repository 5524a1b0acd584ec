//! Brand handlers

use axum::http::HeaderMap;
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;

use shared::error::{ApiResponse, AppError};

use crate::auth::tenant_auth::TenantIdentity;
use crate::db;
use crate::db::brands::Brand;
use crate::state::AppState;

use super::{ApiResult, audit_ctx, internal};

#[derive(Deserialize)]
pub struct CreateRequest {
    pub name: String,
    pub slug: String,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
) -> ApiResult<Vec<Brand>> {
    let brands = db::brands::list(&state.pool, &identity.tenant_id)
        .await
        .map_err(internal)?;
    Ok(ApiResponse::success(brands))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Json(req): Json<CreateRequest>,
) -> ApiResult<Brand> {
    if req.name.trim().is_empty() || req.slug.trim().is_empty() {
        return Err(AppError::validation("Name and slug are required"));
    }

    let brand = db::brands::create(
        &state.pool,
        &identity.tenant_id,
        req.name.trim(),
        req.slug.trim(),
    )
    .await?;
    Ok(ApiResponse::success(brand))
}

/// Refused with 409 while live products still reference the brand.
pub async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    headers: HeaderMap,
    Path(brand_id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    db::brands::soft_delete(&state.pool, &identity.tenant_id, brand_id).await?;

    let ctx = audit_ctx(&identity, &headers);
    let _ = db::audit::log(
        &state.pool,
        Some(&identity.tenant_id),
        "brand_deleted",
        "brand",
        &brand_id.to_string(),
        None,
        &ctx,
        shared::util::now_millis(),
    )
    .await;

    Ok(ApiResponse::success(serde_json::json!({ "deleted": true })))
}
