//! Rate limiter implementation using a token bucket over a sliding window.
//!
//! Enforces the MangaBaka request budget (60 requests per minute by
//! default). State lives behind an async mutex so one limiter can serve
//! concurrent searches.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Caller-supplied callback reporting how long a request will wait for a token
pub type RateLimitCallback = Arc<dyn Fn(Duration) + Send + Sync>;

/// Sliding-window token bucket
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum requests per window
    max_per_window: u32,
    /// Window length
    window: Duration,
    /// Timestamps of requests inside the current window
    recent_requests: Mutex<Vec<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with a requests-per-minute budget
    pub fn new(max_per_minute: u32) -> Self {
        Self::with_window(max_per_minute, Duration::from_secs(60))
    }

    /// Create a limiter with an explicit window (tests use short windows)
    pub fn with_window(max_per_window: u32, window: Duration) -> Self {
        Self {
            max_per_window: max_per_window.max(1),
            window,
            recent_requests: Mutex::new(Vec::with_capacity(max_per_window as usize)),
        }
    }

    /// Wait until a request can be made, then consume a token
    pub async fn acquire(&self, on_wait: Option<&RateLimitCallback>) {
        loop {
            let wait = {
                let mut recent = self.recent_requests.lock().await;
                let now = Instant::now();
                recent.retain(|&t| now.duration_since(t) < self.window);

                if (recent.len() as u32) < self.max_per_window {
                    recent.push(now);
                    None
                } else {
                    // Token frees up when the oldest request leaves the window
                    Some(self.window - now.duration_since(recent[0]))
                }
            };

            match wait {
                None => return,
                Some(wait) => {
                    tracing::debug!(
                        wait_ms = wait.as_millis() as u64,
                        "Rate limit reached, waiting for a token"
                    );
                    if let Some(callback) = on_wait {
                        callback(wait);
                    }
                    sleep(wait).await;
                }
            }
        }
    }

    /// Number of requests recorded inside the current window
    pub async fn current_window_count(&self) -> usize {
        let mut recent = self.recent_requests.lock().await;
        let now = Instant::now();
        recent.retain(|&t| now.duration_since(t) < self.window);
        recent.len()
    }
}
