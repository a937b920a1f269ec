use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::HeaderMap;
use tokio::sync::RwLock;

use crate::errors::AppError;

/// Counts attempts per client key inside a fixed window. Swap the in-memory
/// store for a shared one when running more than one instance.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Records an attempt and returns the number made in the current window,
    /// this one included.
    async fn record_attempt(&self, key: &str) -> anyhow::Result<u32>;
}

#[derive(Debug, Clone)]
struct AttemptWindow {
    attempts: u32,
    started: Instant,
}

pub struct InMemoryAttemptStore {
    windows: RwLock<HashMap<String, AttemptWindow>>,
    window: Duration,
    max_keys: usize,
}

impl InMemoryAttemptStore {
    pub fn new(window: Duration, max_keys: usize) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            window,
            max_keys: max_keys.max(1),
        }
    }

    pub async fn tracked_keys(&self) -> usize {
        self.windows.read().await.len()
    }
}

#[async_trait]
impl AttemptStore for InMemoryAttemptStore {
    async fn record_attempt(&self, key: &str) -> anyhow::Result<u32> {
        let mut windows = self.windows.write().await;
        let now = Instant::now();

        windows.retain(|_, w| now.duration_since(w.started) < self.window);

        if !windows.contains_key(key) && windows.len() >= self.max_keys {
            let oldest = windows
                .iter()
                .min_by_key(|(_, w)| w.started)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                windows.remove(&oldest);
            }
        }

        let entry = windows.entry(key.to_string()).or_insert(AttemptWindow {
            attempts: 0,
            started: now,
        });
        entry.attempts = entry.attempts.saturating_add(1);
        Ok(entry.attempts)
    }
}

pub struct LoginThrottle {
    store: Box<dyn AttemptStore>,
    max_attempts: u32,
}

impl LoginThrottle {
    pub fn new(store: Box<dyn AttemptStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts,
        }
    }

    pub async fn check(&self, key: &str) -> Result<(), AppError> {
        let attempts = self.store.record_attempt(key).await?;
        if attempts > self.max_attempts {
            tracing::warn!(client = key, attempts, "login throttled");
            return Err(AppError::RateLimited(
                "too many login attempts, try again shortly".to_string(),
            ));
        }
        Ok(())
    }
}

/// First `X-Forwarded-For` hop, or `unknown`.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}
