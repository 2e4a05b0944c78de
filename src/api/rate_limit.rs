//! Per-client request quota over a fixed window.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::config::RateLimitConfig;

/// How entries leave the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Every request evicts all other clients' entries before it is counted.
    /// A request from a second client therefore resets the first client's
    /// quota. Kept for compatibility with the deployed service.
    ClearOthers,
    /// Only entries whose window has elapsed are dropped.
    PerKey,
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clear_others" | "legacy" => Ok(Self::ClearOthers),
            "per_key" => Ok(Self::PerKey),
            other => Err(format!("expected clear_others or per_key, got: {}", other)),
        }
    }
}

/// Counter state for one client.
#[derive(Debug, Clone)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_start: Instant,
}

/// The client used up its quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitExceeded {
    pub retry_after: Duration,
}

/// Process-wide limiter keyed by client address.
#[derive(Debug)]
pub struct RateLimiter {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Count a request from `client`, or reject it once the quota is used.
    pub async fn check(&self, client: &str) -> Result<(), RateLimitExceeded> {
        self.check_at(client, Instant::now()).await
    }

    async fn check_at(&self, client: &str, now: Instant) -> Result<(), RateLimitExceeded> {
        let window = self.config.window;
        let mut entries = self.entries.lock().await;

        match self.config.eviction {
            EvictionPolicy::ClearOthers => entries.retain(|key, _| key == client),
            EvictionPolicy::PerKey => {
                entries.retain(|_, entry| now.duration_since(entry.window_start) < window)
            }
        }

        let entry = entries
            .entry(client.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                window_start: now,
            });

        if now.duration_since(entry.window_start) >= window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.config.max_requests {
            let retry_after = window.saturating_sub(now.duration_since(entry.window_start));
            tracing::warn!(
                client = client,
                count = entry.count,
                "Rate limit exceeded"
            );
            return Err(RateLimitExceeded { retry_after });
        }

        entry.count += 1;
        tracing::debug!(
            client = client,
            count = entry.count,
            limit = self.config.max_requests,
            "Rate limit OK"
        );
        Ok(())
    }

    #[cfg(test)]
    async fn tracked_clients(&self) -> usize {
        self.entries.lock().await.len()
    }
}
