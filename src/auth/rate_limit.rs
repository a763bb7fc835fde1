use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::AppState;

/// Login attempts allowed per IP and path within one window.
const MAX_ATTEMPTS: u32 = 5;
const WINDOW_SECS: u64 = 60;
const CLEANUP_INTERVAL_SECS: u64 = 300;

/// In-memory fixed-window limiter. Single instance only.
#[derive(Clone, Default)]
pub struct RateLimitState {
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

struct Window {
    count: u32,
    started: Instant,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the remaining attempts, or how long to wait once exhausted.
    pub async fn check(&self, key: &str) -> Result<u32, Duration> {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        let length = Duration::from_secs(WINDOW_SECS);

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(window.started) > length {
            window.count = 0;
            window.started = now;
        }

        if window.count >= MAX_ATTEMPTS {
            return Err(length.saturating_sub(now.duration_since(window.started)));
        }

        window.count += 1;
        Ok(MAX_ATTEMPTS - window.count)
    }

    /// Drops windows that ended more than one window length ago.
    pub async fn cleanup(&self) -> usize {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        let now = Instant::now();
        let keep_for = Duration::from_secs(WINDOW_SECS * 2);
        windows.retain(|_, w| now.duration_since(w.started) < keep_for);
        before - windows.len()
    }

    pub fn spawn_cleanup_worker(&self) {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));
            loop {
                interval.tick().await;
                let removed = limiter.cleanup().await;
                if removed > 0 {
                    tracing::debug!(removed, "Pruned rate limit windows");
                }
            }
        });
    }
}

/// Rate limiting middleware for login, register and refresh.
pub async fn rate_limit_auth(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // GET on the login form is free; only credential submissions count.
    if req.method() == axum::http::Method::GET {
        return Ok(next.run(req).await);
    }

    let ip = addr.ip().to_string();
    let path = req.uri().path().to_string();
    let key = format!("{}:{}", ip, path);

    match state.rate_limiter.check(&key).await {
        Ok(remaining) => {
            tracing::debug!(ip = %ip, path = %path, remaining, "Rate limit check passed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(
                ip = %ip,
                path = %path,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            Err(AppError::RateLimited)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limit_allows_under_limit() {
        let limiter = RateLimitState::new();
        for i in 0..MAX_ATTEMPTS {
            let result = limiter.check("test_key").await;
            assert!(result.is_ok(), "Attempt {} should be allowed", i + 1);
        }
    }

    #[tokio::test]
    async fn test_rate_limit_blocks_over_limit() {
        let limiter = RateLimitState::new();
        for _ in 0..MAX_ATTEMPTS {
            let _ = limiter.check("test_key").await;
        }
        assert!(limiter.check("test_key").await.is_err());
    }

    #[tokio::test]
    async fn test_different_keys_have_separate_limits() {
        let limiter = RateLimitState::new();
        for _ in 0..MAX_ATTEMPTS {
            let _ = limiter.check("key1").await;
        }
        assert!(limiter.check("key2").await.is_ok());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_fresh_windows() {
        let limiter = RateLimitState::new();
        let _ = limiter.check("fresh").await;
        assert_eq!(limiter.cleanup().await, 0);
    }
}
