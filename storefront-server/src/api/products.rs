//! Product catalog handlers

use axum::http::HeaderMap;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::product::{
    InventoryStatus, Product, ProductCreate, ProductUpdate, ProductVariant,
};

use crate::auth::tenant_auth::TenantIdentity;
use crate::db;
use crate::state::AppState;

use super::{ApiResult, audit_ctx, internal};

/// Product plus derived fields for API responses
#[derive(Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub inventory_status: InventoryStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<ProductVariant>,
}

impl ProductResponse {
    fn new(product: Product) -> Self {
        Self {
            inventory_status: product.inventory_status(),
            product,
            variants: Vec::new(),
        }
    }

    fn with_variants(product: Product, variants: Vec<ProductVariant>) -> Self {
        Self {
            inventory_status: product.inventory_status(),
            product,
            variants,
        }
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<i32>,
    pub per_page: Option<i32>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<ProductResponse>> {
    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let products = db::products::list(&state.pool, &identity.tenant_id, per_page, offset)
        .await
        .map_err(internal)?;

    Ok(ApiResponse::success(products.into_iter().map(ProductResponse::new).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    headers: HeaderMap,
    Json(data): Json<ProductCreate>,
) -> ApiResult<ProductResponse> {
    if data.name.trim().is_empty() {
        return Err(AppError::validation("Product name is required"));
    }
    if data.sku.trim().is_empty() {
        return Err(AppError::validation("Product SKU is required"));
    }
    if data.price < rust_decimal::Decimal::ZERO {
        return Err(AppError::validation("Price must not be negative"));
    }

    let product = db::products::create(&state.pool, &identity.tenant_id, &data).await?;

    let ctx = audit_ctx(&identity, &headers);
    let changes = serde_json::json!({ "name": product.name, "sku": product.sku });
    let _ = db::audit::log(
        &state.pool,
        Some(&identity.tenant_id),
        "product_created",
        "product",
        &product.id.to_string(),
        Some(&changes),
        &ctx,
        shared::util::now_millis(),
    )
    .await;

    let variants = db::products::list_variants(&state.pool, product.id)
        .await
        .map_err(internal)?;
    Ok(ApiResponse::success(ProductResponse::with_variants(product, variants)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Path(product_id): Path<i64>,
) -> ApiResult<ProductResponse> {
    let product = db::products::find(&state.pool, &identity.tenant_id, product_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;

    let variants = db::products::list_variants(&state.pool, product.id)
        .await
        .map_err(internal)?;

    Ok(ApiResponse::success(ProductResponse::with_variants(product, variants)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Path(product_id): Path<i64>,
    Json(data): Json<ProductUpdate>,
) -> ApiResult<ProductResponse> {
    if let Some(price) = data.price
        && price < rust_decimal::Decimal::ZERO
    {
        return Err(AppError::validation("Price must not be negative"));
    }

    let product = db::products::update(&state.pool, &identity.tenant_id, product_id, &data)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;

    Ok(ApiResponse::success(ProductResponse::new(product)))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    headers: HeaderMap,
    Path(product_id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let deleted = db::products::soft_delete(&state.pool, &identity.tenant_id, product_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(AppError::new(ErrorCode::ProductNotFound));
    }

    let ctx = audit_ctx(&identity, &headers);
    let _ = db::audit::log(
        &state.pool,
        Some(&identity.tenant_id),
        "product_deleted",
        "product",
        &product_id.to_string(),
        None,
        &ctx,
        shared::util::now_millis(),
    )
    .await;

    Ok(ApiResponse::success(serde_json::json!({ "deleted": true })))
}

#[derive(Deserialize)]
pub struct AdjustInventoryRequest {
    pub variant_id: Option<i64>,
    /// Signed change to apply (negative to remove stock)
    pub delta: i32,
    pub reason: String,
}

pub async fn adjust_inventory(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    headers: HeaderMap,
    Path(product_id): Path<i64>,
    Json(req): Json<AdjustInventoryRequest>,
) -> ApiResult<db::inventory::Adjustment> {
    if req.reason.trim().is_empty() {
        return Err(AppError::validation("Adjustment reason is required"));
    }
    if req.delta == 0 {
        return Err(AppError::validation("Adjustment delta must not be zero"));
    }

    let adjustment = db::inventory::adjust(
        &state.pool,
        &identity.tenant_id,
        product_id,
        req.variant_id,
        req.delta,
        req.reason.trim(),
    )
    .await?;

    let ctx = audit_ctx(&identity, &headers);
    let changes = serde_json::json!({
        "previous": adjustment.previous_quantity,
        "new": adjustment.new_quantity,
        "reason": req.reason.trim(),
    });
    let _ = db::audit::log(
        &state.pool,
        Some(&identity.tenant_id),
        "inventory_adjusted",
        "product",
        &product_id.to_string(),
        Some(&changes),
        &ctx,
        shared::util::now_millis(),
    )
    .await;

    Ok(ApiResponse::success(adjustment))
}

pub async fn inventory_history(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Path(product_id): Path<i64>,
) -> ApiResult<Vec<db::inventory::InventoryLogEntry>> {
    // Distinguish "no history" from "no such product"
    db::products::find(&state.pool, &identity.tenant_id, product_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;

    let entries = db::inventory::history(&state.pool, &identity.tenant_id, product_id, 100)
        .await
        .map_err(internal)?;
    Ok(ApiResponse::success(entries))
}
