//! Application-layer rate limiting for login and registration routes

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

use shared::error::{ApiResponse, AppError, ErrorCode};

struct IpEntry {
    count: u32,
    window_start: Instant,
}

/// Outcome of a rate limit check, carried into the response headers
struct RateDecision {
    allowed: bool,
    limit: u32,
    remaining: u32,
    retry_after_secs: u64,
}

#[derive(Clone)]
pub struct RateLimiter {
    /// route name -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn check(
        &self,
        route: &'static str,
        ip: &str,
        max_requests: u32,
        window_secs: u64,
    ) -> RateDecision {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(route).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        // Reset window if expired
        let elapsed = now.duration_since(entry.window_start).as_secs();
        if elapsed >= window_secs {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        RateDecision {
            allowed: entry.count <= max_requests,
            limit: max_requests,
            remaining: max_requests.saturating_sub(entry.count),
            retry_after_secs: window_secs.saturating_sub(elapsed.min(window_secs)),
        }
    }

    /// Remove entries older than 5 minutes
    pub async fn cleanup(&self) {
        let mut map = self.inner.lock().await;
        let cutoff = std::time::Duration::from_secs(300);
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < cutoff);
        }

        // Remove empty route maps
        map.retain(|_, route_map| !route_map.is_empty());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract client IP: X-Forwarded-For header first (LB/CDN), then peer address.
fn extract_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
    {
        // X-Forwarded-For can be comma-separated; first entry is the original client
        if let Some(first) = val.split(',').next() {
            let ip = first.trim();
            if !ip.is_empty() {
                return ip.to_owned();
            }
        }
    }

    // Fallback: peer address from extensions (ConnectInfo)
    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

fn too_many_requests(decision: &RateDecision) -> Response {
    let err = AppError::new(ErrorCode::RateLimitExceeded);
    let body = ApiResponse::<()>::error(&err);
    let mut response =
        (StatusCode::TOO_MANY_REQUESTS, axum::Json(body)).into_response();

    let headers = response.headers_mut();
    headers.insert(
        "Retry-After",
        HeaderValue::from_str(&decision.retry_after_secs.to_string())
            .unwrap_or(HeaderValue::from_static("60")),
    );
    headers.insert(
        "X-RateLimit-Limit",
        HeaderValue::from_str(&decision.limit.to_string())
            .unwrap_or(HeaderValue::from_static("0")),
    );
    headers.insert(
        "X-RateLimit-Remaining",
        HeaderValue::from_static("0"),
    );
    response
}

/// Rate limit middleware for login: 5 requests/minute per IP
pub async fn login_rate_limit(
    State(state): State<crate::state::AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = extract_ip(&request);
    let decision = state.rate_limiter.check("login", &ip, 5, 60).await;
    if !decision.allowed {
        return Err(too_many_requests(&decision));
    }
    Ok(next.run(request).await)
}

/// Rate limit middleware for registration: 3 requests/minute per IP
pub async fn register_rate_limit(
    State(state): State<crate::state::AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = extract_ip(&request);
    let decision = state.rate_limiter.check("register", &ip, 3, 60).await;
    if !decision.allowed {
        return Err(too_many_requests(&decision));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            assert!(limiter.check("login", "1.2.3.4", 5, 60).await.allowed);
        }
        let decision = limiter.check("login", "1.2.3.4", 5, 60).await;
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[tokio::test]
    async fn test_ips_are_independent() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            assert!(limiter.check("login", "1.1.1.1", 5, 60).await.allowed);
        }
        assert!(limiter.check("login", "2.2.2.2", 5, 60).await.allowed);
    }

    #[tokio::test]
    async fn test_routes_are_independent() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.check("register", "1.1.1.1", 3, 60).await.allowed);
        }
        assert!(!limiter.check("register", "1.1.1.1", 3, 60).await.allowed);
        assert!(limiter.check("login", "1.1.1.1", 5, 60).await.allowed);
    }
}
