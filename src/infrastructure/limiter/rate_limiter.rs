use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;

/// Per-identifier window state. `count` never exceeds the configured maximum
/// between creation and `window_reset_at`; once the window has passed the
/// record resets to a count of 1 on the next request.
#[derive(Debug)]
pub struct RateLimitRecord {
    count: u32,
    window_reset_at: DateTime<Utc>,
}

/// Result of one check-and-consume call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

type Key = String;

/// Process-wide fixed-window limiter keyed by client identifier.
///
/// Records are created lazily and evicted by `sweep_expired` once their
/// window has passed, so the table stays bounded over the process lifetime.
#[derive(Clone, Default)]
pub struct RateLimiterStore {
    map: Arc<DashMap<Key, Arc<Mutex<RateLimitRecord>>>>,
}

impl RateLimiterStore {
    pub fn new() -> Self {
        RateLimiterStore {
            map: Arc::new(DashMap::new()),
        }
    }

    pub fn check_and_consume(&self, key: &str, max_requests: u32, window: Duration) -> RateDecision {
        self.check_at(key, max_requests, window, Utc::now())
    }

    fn check_at(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> RateDecision {
        let record = self
            .map
            .entry(key.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(RateLimitRecord {
                    count: 0,
                    window_reset_at: now,
                }))
            })
            .clone();

        let mut rec = record.lock();

        if rec.count == 0 || now >= rec.window_reset_at {
            rec.count = 1;
            rec.window_reset_at = now + window;
            return RateDecision {
                allowed: true,
                remaining: max_requests.saturating_sub(1),
                reset_at: rec.window_reset_at,
            };
        }

        if rec.count >= max_requests {
            // Rejected attempts are free: not incrementing keeps a blocked
            // client from extending their own window by retrying.
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_at: rec.window_reset_at,
            };
        }

        rec.count += 1;
        RateDecision {
            allowed: true,
            remaining: max_requests - rec.count,
            reset_at: rec.window_reset_at,
        }
    }

    /// Removes records whose window has already passed. Returns how many
    /// were evicted.
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let expired: Vec<Key> = self
            .map
            .iter()
            .filter_map(|entry| {
                let rec = entry.value().lock();
                if now >= rec.window_reset_at {
                    Some(entry.key().clone())
                } else {
                    None
                }
            })
            .collect();

        let removed = expired.len();
        for key in expired {
            self.map.remove(&key);
        }
        removed
    }

    pub fn tracked_identifiers(&self) -> usize {
        self.map.len()
    }
}
