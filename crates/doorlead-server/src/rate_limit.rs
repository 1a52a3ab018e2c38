//! Per-key submission rate limiting.
//!
//! Handlers depend on the [`RateLimiter`] port only; the shipped
//! implementation is an in-process sliding window, which makes the limit
//! per-instance under horizontal deployment. A shared-store implementation
//! can be injected without touching the handlers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Decides whether a submission from `key` (a source IP) is allowed right
/// now, recording it if so.
pub trait RateLimiter: Send + Sync {
    fn check(&self, key: &str) -> bool;
}

/// Sliding-window limiter: at most `max` accepted submissions per `window`,
/// tracked per key. Entries older than the window are pruned lazily on each
/// check; a denied submission is not recorded.
pub struct SlidingWindowLimiter {
    max: usize,
    window: Duration,
    hits: Mutex<HashMap<String, Vec<Instant>>>,
}

impl SlidingWindowLimiter {
    #[must_use]
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }
}

impl RateLimiter for SlidingWindowLimiter {
    fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let entry = hits.entry(key.to_owned()).or_default();
        entry.retain(|t| now.duration_since(*t) < self.window);

        if entry.len() >= self.max {
            return false;
        }
        entry.push(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_within_window() {
        let limiter = SlidingWindowLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.check("203.0.113.9"));
        assert!(limiter.check("203.0.113.9"));
        assert!(limiter.check("203.0.113.9"));
        assert!(!limiter.check("203.0.113.9"), "4th submission is denied");
    }

    #[test]
    fn keys_are_independent() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("203.0.113.9"));
        assert!(!limiter.check("203.0.113.9"));
        assert!(limiter.check("198.51.100.7"), "other IPs are unaffected");
    }

    #[test]
    fn expired_entries_are_pruned() {
        // A zero-length window means every prior hit is already expired.
        let limiter = SlidingWindowLimiter::new(1, Duration::ZERO);
        assert!(limiter.check("203.0.113.9"));
        assert!(limiter.check("203.0.113.9"));
        assert!(limiter.check("203.0.113.9"));
    }

    #[test]
    fn denied_submissions_are_not_recorded() {
        let limiter = SlidingWindowLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check("k"));
        assert!(limiter.check("k"));
        for _ in 0..10 {
            assert!(!limiter.check("k"));
        }
        // Still exactly two recorded hits.
        let hits = limiter.hits.lock().expect("lock");
        assert_eq!(hits.get("k").map(Vec::len), Some(2));
    }
}
