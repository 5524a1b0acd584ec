//! Audit log query handlers

use axum::{
    Extension,
    extract::{Query, State},
};
use serde::Deserialize;

use shared::error::ApiResponse;

use crate::auth::tenant_auth::TenantIdentity;
use crate::db;
use crate::db::audit::AuditEntry;
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
) -> ApiResult<Vec<AuditEntry>> {
    let per_page = query.per_page.unwrap_or(50).min(200);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let entries = db::audit::query(&state.pool, &identity.tenant_id, per_page, offset)
        .await
        .map_err(internal)?;
    Ok(ApiResponse::success(entries))
}
