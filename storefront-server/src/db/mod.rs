//! Database access layer
//!
//! One module per entity, hand-written SQL, explicit `tenant_id` filters on
//! every tenant-scoped query. Multi-step mutations run inside transactions.

pub mod audit;
pub mod brands;
pub mod categories;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod products;
pub mod tenants;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub(crate) use shared::util::{now_millis, snowflake_id};

use crate::error::{ServiceError, ServiceResult};
use shared::error::{AppError, ErrorCode};

const RETRY_BACKOFF_MS: [u64; 3] = [100, 200, 400];

/// Whether a failed operation hit a Postgres serialization conflict or
/// deadlock and can be retried safely (the transaction rolled back whole).
fn is_serialization_error(err: &ServiceError) -> bool {
    let ServiceError::Db(db_err) = err else {
        return false;
    };
    let Some(sqlx_err) = db_err.downcast_ref::<sqlx::Error>() else {
        return false;
    };
    match sqlx_err {
        sqlx::Error::Database(e) => {
            matches!(e.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}

/// Run a transactional operation with bounded retry on serialization or
/// deadlock failures (100ms, 200ms, 400ms backoff, then give up).
///
/// The operation must be safe to re-run from scratch: it is only retried
/// after the database has rolled the whole transaction back.
pub async fn with_retry<T, F, Fut>(op: F) -> ServiceResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = ServiceResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if is_serialization_error(&e) => {
                if attempt >= RETRY_BACKOFF_MS.len() {
                    tracing::error!("Transaction failed after {attempt} retries");
                    return Err(ServiceError::App(AppError::new(
                        ErrorCode::TransactionAborted,
                    )));
                }
                tracing::warn!(attempt, "Retrying transaction after serialization failure");
                tokio::time::sleep(std::time::Duration::from_millis(RETRY_BACKOFF_MS[attempt]))
                    .await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::{AppError, ErrorCode};

    #[tokio::test]
    async fn test_with_retry_passes_through_success() {
        let result: ServiceResult<i32> = with_retry(|| async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_retry_does_not_retry_business_errors() {
        let calls = std::sync::atomic::AtomicU32::new(0);
        let result: ServiceResult<()> = with_retry(|| async {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(ServiceError::App(AppError::new(ErrorCode::OrderNotFound)))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
