//! Token bucket rate limiter for provider endpoints that meter per-ticker
//! calls.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::debug;

struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    /// Tokens per second.
    rate: f64,
    capacity: f64,
}

impl TokenBucket {
    fn new(requests_per_minute: u32, capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: f64::from(requests_per_minute) / 60.0,
            capacity,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_available(&mut self) -> Duration {
        self.refill();
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        }
    }
}

/// One bucket per connector; bursts up to `capacity`, refills at
/// `requests_per_minute`.
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32, capacity: f64) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(requests_per_minute, capacity)),
        }
    }

    pub fn try_acquire(&self) -> bool {
        match self.bucket.lock() {
            Ok(mut bucket) => bucket.try_acquire(),
            Err(_) => false,
        }
    }

    /// Wait until a token is available, then consume it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let Ok(mut bucket) = self.bucket.lock() else {
                    return;
                };
                if bucket.try_acquire() {
                    return;
                }
                bucket.time_until_available()
            };
            debug!("rate limited, backing off {}ms", wait.as_millis());
            tokio::time::sleep(wait).await;
        }
    }
}
