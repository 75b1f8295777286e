//! In-process rate limiting for password-check failures.
//!
//! Counters live in a concurrent map keyed by lowercased email, with a
//! fixed window starting at the first failure. The periodic sweep
//! prunes windows that have closed.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use cliniq_core::error::{CliniqError, CliniqResult};

#[derive(Debug, Clone, Copy)]
struct FailureWindow {
    count: u32,
    window_start: DateTime<Utc>,
}

pub struct LoginRateLimiter {
    failures: DashMap<String, FailureWindow>,
    limit: u32,
    window: Duration,
}

impl LoginRateLimiter {
    pub fn new(limit: u32, window_secs: i64) -> Self {
        Self {
            failures: DashMap::new(),
            limit,
            window: Duration::seconds(window_secs),
        }
    }

    /// Called before a password check; rejects once the email has
    /// exhausted its failure budget for the current window.
    pub fn check(&self, email: &str) -> CliniqResult<()> {
        if let Some(entry) = self.failures.get(email) {
            let fresh = Utc::now() - entry.window_start < self.window;
            if fresh && entry.count >= self.limit {
                tracing::warn!(target: "audit", email, "login rate limit exceeded");
                return Err(CliniqError::RateLimited);
            }
        }
        Ok(())
    }

    /// Record one failed password check.
    pub fn record_failure(&self, email: &str) {
        let now = Utc::now();
        self.failures
            .entry(email.to_string())
            .and_modify(|w| {
                if now - w.window_start >= self.window {
                    // Window closed; start a new one.
                    *w = FailureWindow {
                        count: 1,
                        window_start: now,
                    };
                } else {
                    w.count += 1;
                }
            })
            .or_insert(FailureWindow {
                count: 1,
                window_start: now,
            });
    }

    /// Forget the email's failures after a successful authentication.
    pub fn clear(&self, email: &str) {
        self.failures.remove(email);
    }

    /// Drop entries whose window has closed.
    pub fn prune(&self) {
        let now = Utc::now();
        self.failures
            .retain(|_, w| now - w.window_start < self.window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_the_limit_passes() {
        let limiter = LoginRateLimiter::new(3, 900);
        limiter.record_failure("a@x.test");
        limiter.record_failure("a@x.test");
        assert!(limiter.check("a@x.test").is_ok());
    }

    #[test]
    fn at_the_limit_rejects() {
        let limiter = LoginRateLimiter::new(3, 900);
        for _ in 0..3 {
            limiter.record_failure("a@x.test");
        }
        assert!(matches!(
            limiter.check("a@x.test"),
            Err(CliniqError::RateLimited)
        ));
        // Other emails are unaffected.
        assert!(limiter.check("b@x.test").is_ok());
    }

    #[test]
    fn success_clears_the_counter() {
        let limiter = LoginRateLimiter::new(3, 900);
        for _ in 0..3 {
            limiter.record_failure("a@x.test");
        }
        limiter.clear("a@x.test");
        assert!(limiter.check("a@x.test").is_ok());
    }

    #[test]
    fn closed_windows_reset_on_next_failure() {
        // Zero-width window: every failure starts a fresh window.
        let limiter = LoginRateLimiter::new(1, 0);
        limiter.record_failure("a@x.test");
        assert!(limiter.check("a@x.test").is_ok());
    }
}
