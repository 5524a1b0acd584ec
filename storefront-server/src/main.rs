//! storefront-server — Multi-tenant commerce platform
//!
//! Long-running service that:
//! - Manages tenant catalogs (products, categories, brands, inventory)
//! - Validates carts and creates orders (checkout)
//! - Drives the order status lifecycle with transactional transitions
//! - Reconciles payment gateway webhooks into payments and orders
//! - Records notifications and an append-only audit trail

mod api;
mod auth;
mod checkout;
mod config;
mod db;
mod email;
mod error;
mod orders;
mod payments;
mod pricing;
mod state;
mod stripe;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting storefront-server (env: {})", config.environment);

    // Initialize application state
    let state = AppState::new(&config).await?;

    // Build router
    let app = api::create_router(state.clone());

    // Periodic rate limiter cleanup (every 5 minutes)
    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
        }
    });

    // Audit log retention sweeper (every 24 hours)
    let sweeper_pool = state.pool.clone();
    let retention_days = state.audit_retention_days;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(86_400));
        loop {
            interval.tick().await;
            match db::audit::purge_older_than(&sweeper_pool, retention_days).await {
                Ok(removed) if removed > 0 => {
                    tracing::info!(removed, "Audit retention sweep completed");
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Audit retention sweep failed"),
            }
        }
    });

    // Start HTTP server
    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("storefront-server listening on {http_addr}");

    axum::serve(http_listener, app).await?;

    Ok(())
}
