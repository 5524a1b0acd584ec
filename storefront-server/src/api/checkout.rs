//! Checkout handlers
//!
//! POST /api/checkout/validate — resolve and validate a cart
//! POST /api/checkout          — validate, price, and create the order

use axum::http::HeaderMap;
use axum::{Extension, Json, extract::State};
use serde::Deserialize;

use shared::error::ApiResponse;
use shared::models::Order;

use crate::auth::tenant_auth::TenantIdentity;
use crate::checkout::{self, CartItemRequest, CartValidation, CheckoutRequest};
use crate::state::AppState;

use super::{ApiResult, audit_ctx};

#[derive(Deserialize)]
pub struct ValidateRequest {
    pub items: Vec<CartItemRequest>,
}

pub async fn validate(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Json(req): Json<ValidateRequest>,
) -> ApiResult<CartValidation> {
    let resolved = checkout::resolve_lines(&state, &identity.tenant_id, &req.items).await?;
    Ok(ApiResponse::success(checkout::validate_cart(&resolved)))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    headers: HeaderMap,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<Order> {
    let ctx = audit_ctx(&identity, &headers);
    let order = checkout::checkout(&state, &identity.tenant_id, &req, &ctx).await?;
    Ok(ApiResponse::success(order))
}
