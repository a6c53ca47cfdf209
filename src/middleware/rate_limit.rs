use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;

use crate::error::ApiError;

/// Counter backing the rate limiter. The middleware only needs
/// hit-and-check semantics, so a shared external counter can be swapped in
/// for multi-instance deployments.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count a hit for `key` and return the total within the current
    /// window. An elapsed window is reset lazily on the key's next hit.
    async fn hit(&self, key: &str, window: Duration) -> u32;
}

struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Process-local store. Entries are reset per key on next access after the
/// window elapses and are never otherwise pruned.
#[derive(Default)]
pub struct MemoryRateLimitStore {
    entries: Mutex<HashMap<String, WindowEntry>>,
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn hit(&self, key: &str, window: Duration) -> u32 {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let entry = entries.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            reset_at: now + window,
        });
        if now >= entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + window;
        }
        entry.count += 1;
        entry.count
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_store(Arc::new(MemoryRateLimitStore::default()), max_requests, window)
    }

    pub fn with_store(store: Arc<dyn RateLimitStore>, max_requests: u32, window: Duration) -> Self {
        Self {
            store,
            max_requests,
            window,
        }
    }

    pub async fn check(&self, key: &str) -> Result<(), ApiError> {
        if self.store.hit(key, self.window).await > self.max_requests {
            return Err(ApiError::TooManyRequests(
                "Too many requests from this IP, please try again later".into(),
            ));
        }
        Ok(())
    }
}

/// Middleware wiring: one hit per request, keyed by the client IP.
pub async fn enforce(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    limiter.check(&ip).await?;
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocks_above_threshold() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.check("1.2.3.4").await.is_ok());
        }
        assert!(limiter.check("1.2.3.4").await.is_err());
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("1.1.1.1").await.is_ok());
        assert!(limiter.check("1.1.1.1").await.is_err());
        assert!(limiter.check("2.2.2.2").await.is_ok());
    }

    #[tokio::test]
    async fn window_resets_lazily() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.check("1.2.3.4").await.is_ok());
        assert!(limiter.check("1.2.3.4").await.is_err());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.check("1.2.3.4").await.is_ok());
    }

    /// A counter that always reports the same total, standing in for a
    /// shared external store.
    struct FixedStore(u32);

    #[async_trait]
    impl RateLimitStore for FixedStore {
        async fn hit(&self, _key: &str, _window: Duration) -> u32 {
            self.0
        }
    }

    #[tokio::test]
    async fn store_is_swappable() {
        let over = RateLimiter::with_store(Arc::new(FixedStore(11)), 10, Duration::from_secs(60));
        assert!(over.check("1.2.3.4").await.is_err());

        let under = RateLimiter::with_store(Arc::new(FixedStore(10)), 10, Duration::from_secs(60));
        assert!(under.check("1.2.3.4").await.is_ok());
    }
}
