use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use dashmap::DashMap;
use parking_lot::Mutex;

/// Token bucket with fractional refill.
#[derive(Debug)]
struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, refill_per_sec: f64) -> Self {
        let now = Instant::now();
        Self {
            capacity,
            tokens: capacity,
            refill_per_sec,
            last_refill: now,
            last_seen: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
            self.last_refill = now;
        }
    }

    /// Takes one token, or returns the whole seconds until one is available.
    fn try_take(&mut self) -> Result<(), u64> {
        let now = Instant::now();
        self.last_seen = now;
        self.refill(now);

        // Small epsilon to avoid fp surprises
        if self.tokens + 1e-12 >= 1.0 {
            self.tokens -= 1.0;
            return Ok(());
        }

        let missing = 1.0 - self.tokens;
        Err(((missing / self.refill_per_sec).ceil() as u64).max(1))
    }
}

/// Per-key rate limiter used for login attempts and AI calls.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<DashMap<String, Arc<Mutex<TokenBucket>>>>,
    capacity: f64,
    refill_per_sec: f64,
    idle_ttl: Duration,
}

impl RateLimiter {
    /// `per_minute` requests per key, with bursts up to the same amount.
    pub fn per_minute(per_minute: u32, idle_ttl: Duration) -> Self {
        let per_minute = per_minute.max(1) as f64;
        Self {
            buckets: Arc::new(DashMap::new()),
            capacity: per_minute,
            refill_per_sec: per_minute / 60.0,
            idle_ttl,
        }
    }

    fn bucket(&self, key: &str) -> Arc<Mutex<TokenBucket>> {
        if let Some(existing) = self.buckets.get(key) {
            return existing.clone();
        }
        self.buckets
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(TokenBucket::new(self.capacity, self.refill_per_sec))))
            .clone()
    }

    /// `Err(retry_after_secs)` when `key` is over its budget.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let bucket = self.bucket(key);
        let result = bucket.lock().try_take();
        if let Err(retry_after) = result {
            tracing::warn!(key, retry_after, "Rate limit exceeded");
        }
        result
    }

    /// Drops buckets not touched for `idle_ttl`; returns how many were removed.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.duration_since(bucket.lock().last_seen) <= self.idle_ttl);
        before.saturating_sub(self.buckets.len())
    }

    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }
}
