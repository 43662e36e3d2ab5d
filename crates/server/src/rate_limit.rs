//! Per-user sliding-window request limiting.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use cardsmith_core::config::RateLimitConfig;

/// Allows at most `max_requests` per key within any trailing `window`.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    /// Timestamps of accepted requests per key, oldest first.
    hits: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    /// Record a request for `key`. Returns false when the key is over its limit.
    pub fn try_acquire(&self, key: &str) -> bool {
        self.try_acquire_at(key, Instant::now())
    }

    fn try_acquire_at(&self, key: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock().unwrap_or_else(PoisonError::into_inner);

        // Drop keys whose whole window has expired so idle users don't accumulate.
        let window = self.window;
        hits.retain(|_, stamps| {
            stamps.retain(|t| now.saturating_duration_since(*t) < window);
            !stamps.is_empty()
        });

        let stamps = hits.entry(key.to_string()).or_default();
        if stamps.len() < self.max_requests as usize {
            stamps.push(now);
            true
        } else {
            false
        }
    }
}
