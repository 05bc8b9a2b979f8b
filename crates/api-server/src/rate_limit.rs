//! Per-user sliding-window limit on bulk operations

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::RateLimitConfig;

pub struct RateLimiter {
    config: RateLimitConfig,
    hits: Mutex<HashMap<Uuid, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request for `user_id`, or return how long until one is allowed.
    pub async fn check(&self, user_id: Uuid) -> Result<(), Duration> {
        self.check_at(user_id, Instant::now()).await
    }

    pub async fn check_at(&self, user_id: Uuid, now: Instant) -> Result<(), Duration> {
        let mut hits = self.hits.lock().await;

        // Drop expired hits for every caller, and callers left with none.
        let span = self.config.window;
        hits.retain(|_, window| {
            while let Some(oldest) = window.front() {
                if now.saturating_duration_since(*oldest) >= span {
                    window.pop_front();
                } else {
                    break;
                }
            }
            !window.is_empty()
        });

        let window = hits.entry(user_id).or_default();

        if window.len() >= self.config.max_requests {
            let retry_after = window
                .front()
                .map(|oldest| self.config.window - now.saturating_duration_since(*oldest))
                .unwrap_or(self.config.window);
            return Err(retry_after);
        }

        window.push_back(now);
        Ok(())
    }
}
