use std::sync::Arc;

use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::{cache::ViewCache, limiter::RateLimiter};

pub const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

/// One sweep: expired cached views and idle rate-limit buckets.
pub fn run_maintenance_pass(view_cache: &ViewCache, rate_limiter: &RateLimiter) -> (usize, usize) {
    let expired_views = view_cache.evict_expired();
    let idle_buckets = rate_limiter.evict_idle();
    (expired_views, idle_buckets)
}

pub async fn start_maintenance_task(view_cache: Arc<ViewCache>, rate_limiter: RateLimiter, every: Duration) {
    let mut interval = interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let (expired_views, idle_buckets) = run_maintenance_pass(&view_cache, &rate_limiter);
        if expired_views > 0 || idle_buckets > 0 {
            tracing::debug!(expired_views, idle_buckets, "Maintenance sweep");
        }
    }
}
