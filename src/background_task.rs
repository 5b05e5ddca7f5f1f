use tokio::time::{Duration, interval};

use crate::limiter::rate_limiter::RateLimiterStore;

/// Periodically evicts rate-limit records whose window has passed so the
/// identifier table stays bounded for the process lifetime.
pub async fn start_rate_limit_sweep(limiter: RateLimiterStore, every: Duration) {
    let mut interval = interval(every);

    loop {
        interval.tick().await;

        let removed = limiter.sweep_expired();
        if removed > 0 {
            tracing::debug!(
                "evicted {} expired rate-limit records, {} tracked",
                removed,
                limiter.tracked_identifiers()
            );
        }
    }
}
