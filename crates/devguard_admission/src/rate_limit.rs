//! True token bucket (`tokens, last_refill`) rather than a timestamp deque.
//! One bucket per remote IP in a `DashMap`, each guarded by its own
//! `tokio::sync::Mutex` so a refill on one IP never blocks another.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::error::AdmissionError;

struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(rate: f64) -> Self {
        Self {
            tokens: rate,
            last_refill: Instant::now(),
        }
    }

    fn try_acquire(&mut self, rate: f64, per: Duration) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        let refill_rate = rate / per.as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(rate);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

pub struct TokenBucketLimiter {
    rate: f64,
    per: Duration,
    buckets: DashMap<IpAddr, Mutex<TokenBucket>>,
}

impl TokenBucketLimiter {
    pub fn new(rate: u32, per_seconds: u64) -> Self {
        Self {
            rate: rate as f64,
            per: Duration::from_secs(per_seconds.max(1)),
            buckets: DashMap::new(),
        }
    }

    pub async fn check(&self, remote_ip: IpAddr) -> Result<(), AdmissionError> {
        let entry = self
            .buckets
            .entry(remote_ip)
            .or_insert_with(|| Mutex::new(TokenBucket::new(self.rate)));
        let mut bucket = entry.lock().await;
        if bucket.try_acquire(self.rate, self.per) {
            Ok(())
        } else {
            Err(AdmissionError::RateLimited {
                retry_after_secs: self.per.as_secs(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rate_plus_one_request_is_rejected() {
        let limiter = TokenBucketLimiter::new(3, 60);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        for _ in 0..3 {
            assert!(limiter.check(ip).await.is_ok());
        }
        assert!(limiter.check(ip).await.is_err());
    }

    #[tokio::test]
    async fn different_ips_have_independent_buckets() {
        let limiter = TokenBucketLimiter::new(1, 60);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limiter.check(a).await.is_ok());
        assert!(limiter.check(b).await.is_ok());
        assert!(limiter.check(a).await.is_err());
    }
}
