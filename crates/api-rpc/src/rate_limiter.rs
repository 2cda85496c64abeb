//! Rate Limiter (Token Bucket)
//!
//! Caps request throughput on the RPC surface. A single mutex-guarded
//! bucket is plenty here: the server is localhost-only and every handler
//! takes the lock for a few arithmetic operations.

use std::time::Instant;
use tokio::sync::Mutex;

/// Token bucket rate limiter
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    max_tokens: u32,
    refill_per_sec: u32,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// `max_tokens` is the burst size, `refill_per_sec` the sustained rate.
    pub fn new(max_tokens: u32, refill_per_sec: u32) -> Self {
        Self {
            bucket: Mutex::new(Bucket {
                tokens: max_tokens as f64,
                last_refill: Instant::now(),
            }),
            max_tokens,
            refill_per_sec,
        }
    }

    /// Consume one token. Returns false when the bucket is empty.
    pub async fn check(&self) -> bool {
        let mut bucket = self.bucket.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens =
            (bucket.tokens + elapsed * self.refill_per_sec as f64).min(self.max_tokens as f64);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Remaining tokens (for tests and monitoring)
    #[allow(dead_code)]
    pub async fn remaining(&self) -> f64 {
        self.bucket.lock().await.tokens
    }
}
