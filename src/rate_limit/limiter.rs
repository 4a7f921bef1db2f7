//! Per-client token-bucket admission control.
//!
//! Refill is lazy: a bucket is topped up from the elapsed time whenever its
//! client is seen, so there is no per-client timer. A single background task
//! evicts buckets that have been idle for ten intervals.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Idle buckets are evicted after this many refill intervals.
const IDLE_INTERVALS: u32 = 10;

/// Token-bucket parameters, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Tokens replenished per `interval`.
    pub rate: u32,
    /// Bucket capacity.
    pub burst: u32,
    /// Replenishment interval.
    pub interval: Duration,
}

impl Default for RateLimitConfig {
    /// 60 requests per minute sustained, bursts of 120.
    fn default() -> Self {
        Self {
            rate: 60,
            burst: 120,
            interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

impl Bucket {
    /// Adds the tokens earned since `last_refill`, capped at `burst`.
    ///
    /// `last_refill` only advances by the time the credited tokens cover,
    /// so partial progress toward the next token is kept.
    fn refill(&mut self, now: Instant, limits: &RateLimitConfig) {
        let interval = limits.interval.as_nanos();
        let elapsed = now.saturating_duration_since(self.last_refill).as_nanos();
        let earned = elapsed.saturating_mul(u128::from(limits.rate)) / interval;
        if earned == 0 {
            return;
        }

        let room = limits.burst.saturating_sub(self.tokens);
        if earned >= u128::from(room) {
            self.tokens = limits.burst;
            self.last_refill = now;
            return;
        }

        let credited = u32::try_from(earned).unwrap_or(room);
        self.tokens += credited;
        let covered = interval * u128::from(credited) / u128::from(limits.rate);
        self.last_refill += Duration::from_nanos(u64::try_from(covered).unwrap_or(u64::MAX));
    }
}

/// In-memory token-bucket rate limiter keyed by client address.
///
/// The bucket map sits behind its own [`Mutex`], unrelated to any registry
/// lock.
#[derive(Debug)]
pub struct RateLimiter {
    limits: RateLimitConfig,
    buckets: Mutex<HashMap<IpAddr, Bucket>>,
}

impl RateLimiter {
    /// Creates a limiter. Zero `rate`, `burst`, or `interval` are raised to
    /// the smallest usable value.
    #[must_use]
    pub fn new(limits: RateLimitConfig) -> Self {
        let limits = RateLimitConfig {
            rate: limits.rate.max(1),
            burst: limits.burst.max(1),
            interval: limits.interval.max(Duration::from_millis(1)),
        };
        Self {
            limits,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Effective limits.
    #[must_use]
    pub const fn limits(&self) -> &RateLimitConfig {
        &self.limits
    }

    /// Returns `true` if a request from `client` is admitted.
    ///
    /// A client seen for the first time starts with a full bucket, minus the
    /// token this request consumes.
    pub async fn allow(&self, client: IpAddr) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        match buckets.entry(client) {
            Entry::Vacant(slot) => {
                slot.insert(Bucket {
                    tokens: self.limits.burst - 1,
                    last_refill: now,
                });
                true
            }
            Entry::Occupied(mut slot) => {
                let bucket = slot.get_mut();
                bucket.refill(now, &self.limits);
                if bucket.tokens > 0 {
                    bucket.tokens -= 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Time needed to earn one token.
    #[must_use]
    pub fn retry_after(&self) -> Duration {
        self.limits.interval / self.limits.rate
    }

    /// How long a bucket may stay untouched before it is evicted.
    #[must_use]
    pub fn idle_ttl(&self) -> Duration {
        self.limits.interval.saturating_mul(IDLE_INTERVALS)
    }

    /// Drops buckets whose last refill is older than [`Self::idle_ttl`].
    /// Returns the number removed.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let ttl = self.idle_ttl();
        let mut buckets = self.buckets.lock().await;
        let before = buckets.len();
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) <= ttl);
        before - buckets.len()
    }

    /// Number of tracked clients.
    pub async fn client_count(&self) -> usize {
        self.buckets.lock().await.len()
    }

    /// Runs [`Self::evict_idle`] every [`Self::idle_ttl`] on a background task.
    pub fn spawn_evictor(self: Arc<Self>) -> JoinHandle<()> {
        let period = self.idle_ttl();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = self.evict_idle().await;
                if evicted > 0 {
                    tracing::debug!(evicted, "evicted idle rate-limit buckets");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 168, 1, last))
    }

    fn limiter(rate: u32, burst: u32, interval: Duration) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            rate,
            burst,
            interval,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn burst_then_reject_then_refill() {
        let rl = limiter(2, 2, Duration::from_secs(1));

        assert!(rl.allow(ip(1)).await, "first request should be allowed");
        assert!(rl.allow(ip(1)).await, "second request should be allowed");
        assert!(!rl.allow(ip(1)).await, "third request should be denied");

        tokio::time::advance(Duration::from_millis(1100)).await;
        assert!(rl.allow(ip(1)).await, "request should be allowed after refill");
    }

    #[tokio::test(start_paused = true)]
    async fn clients_have_independent_buckets() {
        let rl = limiter(2, 2, Duration::from_secs(1));
        assert!(rl.allow(ip(1)).await);
        assert!(rl.allow(ip(1)).await);
        assert!(!rl.allow(ip(1)).await);

        assert!(rl.allow(ip(2)).await, "different client should be allowed");
        assert!(rl.allow(ip(2)).await);
        assert_eq!(rl.client_count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refill_is_capped_at_burst() {
        let rl = limiter(1, 3, Duration::from_secs(1));
        for _ in 0..3 {
            assert!(rl.allow(ip(1)).await);
        }
        assert!(!rl.allow(ip(1)).await);

        tokio::time::advance(Duration::from_secs(100)).await;
        for _ in 0..3 {
            assert!(rl.allow(ip(1)).await);
        }
        assert!(!rl.allow(ip(1)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn frequent_polling_keeps_partial_progress() {
        let rl = limiter(1, 1, Duration::from_secs(1));
        assert!(rl.allow(ip(1)).await);

        // Rejected probes every 400ms must not reset progress toward the
        // next token.
        tokio::time::advance(Duration::from_millis(400)).await;
        assert!(!rl.allow(ip(1)).await);
        tokio::time::advance(Duration::from_millis(400)).await;
        assert!(!rl.allow(ip(1)).await);
        tokio::time::advance(Duration::from_millis(400)).await;
        assert!(rl.allow(ip(1)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn sustained_rate_matches_configuration() {
        let rl = limiter(60, 1, Duration::from_secs(60));
        assert!(rl.allow(ip(1)).await);
        assert!(!rl.allow(ip(1)).await);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(rl.allow(ip(1)).await);
        assert_eq!(rl.retry_after(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn evict_idle_drops_only_idle_buckets() {
        let rl = limiter(2, 2, Duration::from_secs(1));
        rl.allow(ip(1)).await;
        tokio::time::advance(Duration::from_secs(8)).await;
        rl.allow(ip(2)).await;
        tokio::time::advance(Duration::from_secs(3)).await;

        assert_eq!(rl.evict_idle().await, 1);
        assert_eq!(rl.client_count().await, 1);
        // The evicted client starts over with a full bucket.
        assert!(rl.allow(ip(1)).await);
        assert!(rl.allow(ip(1)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn background_evictor_bounds_memory() {
        let rl = Arc::new(limiter(2, 2, Duration::from_secs(1)));
        for last in 1..=5 {
            rl.allow(ip(last)).await;
        }
        let handle = Arc::clone(&rl).spawn_evictor();

        tokio::time::sleep(Duration::from_secs(21)).await;
        assert_eq!(rl.client_count().await, 0);
        handle.abort();
    }

    #[test]
    fn zero_limits_are_clamped() {
        let rl = limiter(0, 0, Duration::ZERO);
        assert_eq!(rl.limits().rate, 1);
        assert_eq!(rl.limits().burst, 1);
        assert_eq!(rl.limits().interval, Duration::from_millis(1));
    }
}
