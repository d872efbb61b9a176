//! Fixed-window request counting keyed by client identity.
//!
//! Counters live in process memory, so several server instances do not share
//! quota. Identities come from `X-Forwarded-For` and can be spoofed by any
//! client that sets the header itself.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug, Clone, Copy)]
struct Counter {
    count: u32,
    reset_at: Instant,
}

/// Outcome of accounting a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Instant,
}

impl RateLimitDecision {
    /// Whole seconds until the window rolls over, never less than one.
    pub fn retry_after_secs(&self, now: Instant) -> u64 {
        let wait = self.reset_at.saturating_duration_since(now);
        let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
        secs.max(1)
    }
}

#[derive(Clone)]
pub struct FixedWindowLimiter {
    inner: Arc<LimiterInner>,
}

struct LimiterInner {
    limit: u32,
    window: Duration,
    counters: DashMap<String, Counter>,
}

impl FixedWindowLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        FixedWindowLimiter {
            inner: Arc::new(LimiterInner {
                limit,
                window,
                counters: DashMap::new(),
            }),
        }
    }

    /// Counts one request for `client` at `now`.
    ///
    /// The entry guard holds the shard lock for the whole reset-and-increment,
    /// so two requests from one client never lose an update.
    pub fn check_at(&self, client: &str, now: Instant) -> RateLimitDecision {
        let window = self.inner.window;
        let mut entry = self
            .inner
            .counters
            .entry(client.to_string())
            .or_insert_with(|| Counter {
                count: 0,
                reset_at: now + window,
            });
        let counter = entry.value_mut();

        if now >= counter.reset_at {
            counter.count = 0;
            counter.reset_at = now + window;
        }
        counter.count = counter.count.saturating_add(1);

        let limit = self.inner.limit;
        RateLimitDecision {
            allowed: counter.count <= limit,
            limit,
            remaining: limit.saturating_sub(counter.count),
            reset_at: counter.reset_at,
        }
    }

    /// Drops counters whose window has already ended, returning how many were removed.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let before = self.inner.counters.len();
        self.inner.counters.retain(|_, counter| now < counter.reset_at);
        before.saturating_sub(self.inner.counters.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.inner.counters.len()
    }
}
