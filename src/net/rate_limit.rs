// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fixed-window request limiter owned by one network module instance.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RateLimiter {
    limit: i32,
    period: Duration,
    window_start: Option<Instant>,
    granted_in_window: i32,
}

impl RateLimiter {
    /// A `limit` of zero or less disables limiting.
    pub fn new(limit: i32, period: Duration) -> Self {
        Self {
            limit,
            period,
            window_start: None,
            granted_in_window: 0,
        }
    }

    pub fn set_limit(&mut self, limit: i32) {
        self.limit = limit;
    }

    /// Negative periods are treated as zero.
    pub fn set_period_seconds(&mut self, seconds: i32) {
        self.period = Duration::from_secs(seconds.max(0) as u64);
    }

    pub fn limit(&self) -> i32 {
        self.limit
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn in_window(&self, now: Instant) -> bool {
        self.window_start
            .is_some_and(|start| now.saturating_duration_since(start) < self.period)
    }

    /// True when a request issued at `now` must be rejected without a transfer.
    pub fn is_limited_at(&self, now: Instant) -> bool {
        self.limit > 0 && self.in_window(now) && self.granted_in_window >= self.limit
    }

    pub fn is_limited(&self) -> bool {
        self.is_limited_at(Instant::now())
    }

    /// Counts a completed request, opening a new window once the period has elapsed.
    pub fn record_at(&mut self, now: Instant) {
        if self.in_window(now) {
            self.granted_in_window += 1;
        } else {
            self.window_start = Some(now);
            self.granted_in_window = 1;
        }
    }

    pub fn record(&mut self) {
        self.record_at(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_limiter_never_limits() {
        let mut limiter = RateLimiter::new(0, Duration::from_secs(60));
        let now = Instant::now();
        for _ in 0..100 {
            limiter.record_at(now);
        }
        assert!(!limiter.is_limited_at(now));
    }

    #[test]
    fn test_limit_reached_within_period() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(10));
        let start = Instant::now();

        assert!(!limiter.is_limited_at(start));
        limiter.record_at(start);
        assert!(!limiter.is_limited_at(start));
        limiter.record_at(start + Duration::from_secs(1));

        assert!(limiter.is_limited_at(start + Duration::from_secs(2)));
    }

    #[test]
    fn test_window_resets_after_period() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(5));
        let start = Instant::now();
        limiter.record_at(start);
        assert!(limiter.is_limited_at(start + Duration::from_secs(4)));

        let later = start + Duration::from_secs(6);
        assert!(!limiter.is_limited_at(later));
        limiter.record_at(later);
        assert!(limiter.is_limited_at(later + Duration::from_secs(1)));
    }

    #[test]
    fn test_period_setter_clamps_negative() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(5));
        limiter.set_period_seconds(-3);
        assert_eq!(limiter.period(), Duration::ZERO);
    }
}
