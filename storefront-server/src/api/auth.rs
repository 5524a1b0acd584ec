//! Tenant authentication handlers
//!
//! POST /api/auth/register — create tenant account
//! POST /api/auth/login    — verify credentials, return JWT

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use shared::error::{ApiResponse, AppError, ErrorCode};

use crate::auth::tenant_auth;
use crate::db;
use crate::state::AppState;

use super::{ApiResult, internal};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub tenant_id: String,
    pub email: String,
}

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    let email = req.email.trim().to_lowercase();

    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("Invalid email"));
    }
    if req.password.len() < 8 {
        return Err(AppError::new(ErrorCode::PasswordTooShort));
    }

    if db::tenants::find_by_email(&state.pool, &email)
        .await
        .map_err(internal)?
        .is_some()
    {
        return Err(AppError::new(ErrorCode::TenantEmailExists));
    }

    let hashed_password = hash_password(&req.password).map_err(internal)?;
    let tenant_id = uuid::Uuid::new_v4().to_string();
    let now = shared::util::now_millis();

    db::tenants::create(
        &state.pool,
        &tenant_id,
        &email,
        &hashed_password,
        req.name.as_deref(),
        now,
    )
    .await
    .map_err(internal)?;

    tracing::info!(tenant_id = %tenant_id, "Tenant registered");

    let token = tenant_auth::create_token(&tenant_id, &email, &state.jwt_secret)
        .map_err(internal)?;

    Ok(ApiResponse::success(AuthResponse {
        token,
        tenant_id,
        email,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let email = req.email.trim().to_lowercase();

    let tenant = db::tenants::authenticate(&state.pool, &email, &req.password)
        .await
        .map_err(internal)?
        .ok_or_else(AppError::invalid_credentials)?;

    let token = tenant_auth::create_token(&tenant.id, &tenant.email, &state.jwt_secret)
        .map_err(internal)?;

    tracing::info!(tenant_id = %tenant.id, "Tenant logged in");

    Ok(ApiResponse::success(AuthResponse {
        token,
        tenant_id: tenant.id,
        email: tenant.email,
    }))
}
