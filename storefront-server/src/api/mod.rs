//! API routes

pub mod audit;
pub mod auth;
pub mod brands;
pub mod categories;
pub mod checkout;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod payment_webhook;
pub mod payments;
pub mod products;

use axum::http::HeaderMap;
use axum::routing::{delete, get, post, put};
use axum::{Router, middleware};

use shared::error::{ApiResponse, AppError, ErrorCode};

use crate::auth::rate_limit::{login_rate_limit, register_rate_limit};
use crate::auth::tenant_auth::{TenantIdentity, tenant_auth_middleware};
use crate::db::audit::AuditContext;
use crate::state::AppState;

/// Handlers return the success envelope or an [`AppError`]; both render
/// to the unified response shape.
pub(crate) type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Map an infrastructure error to an opaque 500 after logging it.
pub(crate) fn internal<E: std::fmt::Display>(e: E) -> AppError {
    tracing::error!(error = %e, "Internal error");
    AppError::new(ErrorCode::InternalError)
}

/// Build the audit context for a request: acting tenant plus client
/// IP / user agent from the headers.
pub(crate) fn audit_ctx(identity: &TenantIdentity, headers: &HeaderMap) -> AuditContext {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    AuditContext {
        actor: identity.email.clone(),
        ip_address,
        user_agent,
    }
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Public auth routes (rate limited per IP)
    let register = Router::new()
        .route("/api/auth/register", post(auth::register))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            register_rate_limit,
        ));
    let login = Router::new()
        .route("/api/auth/login", post(auth::login))
        .layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    // Gateway webhook (signature-verified, raw body)
    let webhook = Router::new().route("/webhooks/payment", post(payment_webhook::handle_webhook));

    // Tenant management API (JWT authenticated)
    let tenant = Router::new()
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/{id}",
            get(products::get).put(products::update).delete(products::remove),
        )
        .route(
            "/api/products/{id}/inventory",
            get(products::inventory_history).post(products::adjust_inventory),
        )
        .route("/api/categories", get(categories::list).post(categories::create))
        .route("/api/categories/{id}", delete(categories::remove))
        .route("/api/brands", get(brands::list).post(brands::create))
        .route("/api/brands/{id}", delete(brands::remove))
        .route("/api/checkout/validate", post(checkout::validate))
        .route("/api/checkout", post(checkout::create))
        .route("/api/orders", get(orders::list))
        .route("/api/orders/export", get(orders::export))
        .route("/api/orders/{id}", get(orders::get).delete(orders::remove))
        .route("/api/orders/{id}/status", put(orders::update_status))
        .route(
            "/api/orders/{id}/payment-intent",
            post(payments::create_intent),
        )
        .route("/api/orders/{id}/payments", get(payments::list_for_order))
        .route("/api/payments/{id}/refund", post(payments::refund))
        .route("/api/notifications", get(notifications::list))
        .route(
            "/api/notifications/{id}/read",
            post(notifications::mark_read),
        )
        .route("/api/audit-logs", get(audit::list))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            tenant_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(register)
        .merge(login)
        .merge(webhook)
        .merge(tenant)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}
