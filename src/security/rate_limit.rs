//! Per-client token bucket rate limiting.
//!
//! One bucket per client address, created lazily on first sight and
//! evicted after a period of inactivity.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::observability::metrics;

/// Idle time after which a client's bucket is dropped.
pub const ENTRY_TTL: Duration = Duration::from_secs(10 * 60);

/// A simple token bucket rate limiter.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        if now > self.last_update {
            self.last_update = now;
        }

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

struct RateLimitEntry {
    bucket: Arc<Mutex<TokenBucket>>,
    last_seen: Instant,
}

/// Per-address limiter: `requests_per_minute` tokens of burst, refilled
/// continuously at `requests_per_minute / 60` tokens per second.
pub struct RateLimiter {
    entries: Mutex<HashMap<IpAddr, RateLimitEntry>>,
    requests_per_minute: u32,
    ttl: Duration,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self::with_ttl(requests_per_minute, ENTRY_TTL)
    }

    pub fn with_ttl(requests_per_minute: u32, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            requests_per_minute: requests_per_minute.max(1),
            ttl,
        }
    }

    /// Configured budget, reported back to throttled clients.
    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Consume one token for `addr`. Returns false when the bucket is empty.
    pub fn allow(&self, addr: IpAddr) -> bool {
        self.allow_at(addr, Instant::now())
    }

    pub(crate) fn allow_at(&self, addr: IpAddr, now: Instant) -> bool {
        let capacity = f64::from(self.requests_per_minute);
        let bucket = self.bucket_for(addr.to_canonical(), now, capacity);

        let mut bucket = bucket.lock().unwrap_or_else(|e| e.into_inner());
        bucket.try_acquire(capacity, capacity / 60.0, now)
    }

    /// Lookup-or-create under the map lock, sweeping idle entries on the way.
    fn bucket_for(&self, addr: IpAddr, now: Instant, capacity: f64) -> Arc<Mutex<TokenBucket>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let ttl = self.ttl;
        entries.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= ttl);

        let entry = entries.entry(addr).or_insert_with(|| RateLimitEntry {
            bucket: Arc::new(Mutex::new(TokenBucket::new(capacity, now))),
            last_seen: now,
        });
        if now > entry.last_seen {
            entry.last_seen = now;
        }
        let bucket = Arc::clone(&entry.bucket);

        metrics::record_tracked_clients(entries.len());
        bucket
    }

    /// Number of addresses currently holding a bucket.
    pub fn tracked_clients(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_burst_then_deny() {
        let limiter = RateLimiter::new(5);
        let now = Instant::now();
        for _ in 0..5 {
            assert!(limiter.allow_at(ip("10.0.0.1"), now));
        }
        assert!(!limiter.allow_at(ip("10.0.0.1"), now));
    }

    #[test]
    fn test_refill_after_interval() {
        let limiter = RateLimiter::new(60);
        let start = Instant::now();
        for _ in 0..60 {
            assert!(limiter.allow_at(ip("10.0.0.1"), start));
        }
        assert!(!limiter.allow_at(ip("10.0.0.1"), start));

        // 60/min refills one token per second.
        let later = start + Duration::from_millis(1_001);
        assert!(limiter.allow_at(ip("10.0.0.1"), later));
        assert!(!limiter.allow_at(ip("10.0.0.1"), later));
    }

    #[test]
    fn test_refill_real_clock() {
        let limiter = RateLimiter::new(600);
        for _ in 0..600 {
            limiter.allow(ip("10.0.0.9"));
        }
        assert!(!limiter.allow(ip("10.0.0.9")));
        thread::sleep(Duration::from_millis(150));
        assert!(limiter.allow(ip("10.0.0.9")));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new(1);
        let now = Instant::now();
        assert!(limiter.allow_at(ip("10.0.0.1"), now));
        assert!(!limiter.allow_at(ip("10.0.0.1"), now));
        assert!(limiter.allow_at(ip("10.0.0.2"), now));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_ipv4_mapped_shares_bucket() {
        let limiter = RateLimiter::new(1);
        let now = Instant::now();
        assert!(limiter.allow_at(ip("10.0.0.1"), now));
        assert!(!limiter.allow_at(ip("::ffff:10.0.0.1"), now));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_idle_entries_are_evicted() {
        let limiter = RateLimiter::new(10);
        let start = Instant::now();
        limiter.allow_at(ip("10.0.0.1"), start);
        limiter.allow_at(ip("10.0.0.2"), start + Duration::from_secs(300));
        assert_eq!(limiter.tracked_clients(), 2);

        // .1 idle for 11 minutes, .2 for 6 minutes.
        limiter.allow_at(ip("10.0.0.3"), start + Duration::from_secs(660));
        assert_eq!(limiter.tracked_clients(), 2);

        let entries = limiter.entries.lock().unwrap();
        assert!(!entries.contains_key(&ip("10.0.0.1")));
        assert!(entries.contains_key(&ip("10.0.0.2")));
    }

    #[test]
    fn test_evicted_client_gets_fresh_bucket() {
        let limiter = RateLimiter::new(1);
        let start = Instant::now();
        assert!(limiter.allow_at(ip("10.0.0.1"), start));
        assert!(!limiter.allow_at(ip("10.0.0.1"), start));

        let later = start + ENTRY_TTL + Duration::from_secs(1);
        limiter.allow_at(ip("10.0.0.2"), later);
        assert!(limiter.allow_at(ip("10.0.0.1"), later));
    }

    #[test]
    fn test_concurrent_first_access_creates_one_bucket() {
        const THREADS: usize = 32;
        let limiter = RateLimiter::new(10);
        let barrier = Barrier::new(THREADS);

        let allowed: usize = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        limiter.allow(ip("203.0.113.7"))
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap() as usize)
                .sum()
        });

        assert_eq!(limiter.tracked_clients(), 1);
        assert_eq!(allowed, 10);
    }
}
