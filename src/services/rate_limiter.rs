//! Login rate limiter
//!
//! Counts failed logins per email. Once `max_failures` land inside the
//! window, further attempts for that email are refused until the oldest
//! failure ages out. A successful login clears the record.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Failures allowed inside the window
pub const MAX_FAILURES: usize = 5;

/// Window length in minutes
pub const WINDOW_MINUTES: i64 = 15;

/// Login rate limiter
#[derive(Clone)]
pub struct LoginRateLimiter {
    failures: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
    max_failures: usize,
    window: Duration,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::with_limits(MAX_FAILURES, Duration::minutes(WINDOW_MINUTES))
    }

    pub fn with_limits(max_failures: usize, window: Duration) -> Self {
        Self {
            failures: Arc::new(RwLock::new(HashMap::new())),
            max_failures,
            window,
        }
    }

    fn key(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Whether the email has used up its attempts
    pub async fn is_limited(&self, email: &str) -> bool {
        let mut failures = self.failures.write().await;
        let cutoff = Utc::now() - self.window;
        match failures.get_mut(&Self::key(email)) {
            Some(times) => {
                times.retain(|t| *t > cutoff);
                times.len() >= self.max_failures
            }
            None => false,
        }
    }

    /// Record a failed attempt
    pub async fn record_failure(&self, email: &str) {
        let mut failures = self.failures.write().await;
        failures.entry(Self::key(email)).or_default().push(Utc::now());
    }

    /// Forget failures after a successful login
    pub async fn clear(&self, email: &str) {
        self.failures.write().await.remove(&Self::key(email));
    }

    /// Drop entries whose failures have all aged out
    pub async fn cleanup(&self) -> usize {
        let cutoff = Utc::now() - self.window;
        let mut failures = self.failures.write().await;
        let before = failures.len();
        failures.retain(|_, times| {
            times.retain(|t| *t > cutoff);
            !times.is_empty()
        });
        before - failures.len()
    }

    /// Number of emails currently tracked
    pub async fn tracked(&self) -> usize {
        self.failures.read().await.len()
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
