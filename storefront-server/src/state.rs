//! Application state

use aws_sdk_sesv2::Client as SesClient;
use sqlx::PgPool;

use crate::auth::rate_limit::RateLimiter;
use crate::config::Config;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// AWS SES client for sending transactional email
    pub ses: SesClient,
    /// SES sender email address
    pub ses_from_email: String,
    /// Payment gateway secret key
    pub stripe_secret_key: String,
    /// Payment gateway webhook signing secret
    pub stripe_webhook_secret: String,
    /// JWT secret for tenant authentication
    pub jwt_secret: String,
    /// Rate limiter for login/registration routes
    pub rate_limiter: RateLimiter,
    /// Audit log retention window in days
    pub audit_retention_days: i64,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let ses = if let Ok(ses_region) = std::env::var("SES_REGION") {
            let ses_config = aws_config
                .to_builder()
                .region(aws_config::Region::new(ses_region))
                .build();
            SesClient::new(&ses_config)
        } else {
            SesClient::new(&aws_config)
        };

        Ok(Self {
            pool,
            ses,
            ses_from_email: config.ses_from_email.clone(),
            stripe_secret_key: config.stripe_secret_key.clone(),
            stripe_webhook_secret: config.stripe_webhook_secret.clone(),
            jwt_secret: config.jwt_secret.clone(),
            rate_limiter: RateLimiter::new(),
            audit_retention_days: config.audit_retention_days,
        })
    }
}
