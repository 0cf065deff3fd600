// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory [`AdmissionQueue`] backed by a classic token bucket: `capacity`
//! tokens refilled at `refill_per_sec`, one consumed per admitted request.
//!
//! Unlike a concurrency semaphore, a rate limiter never "returns" a token on
//! completion. [`AdmissionQueue::done`] is a no-op here, kept only to
//! satisfy the trait (a deployment that swaps this for a true semaphore-based
//! queue would give it teeth).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use radius_core::{AdmissionQueue, Token};

/// Plain token bucket: tokens accrue at `refill_per_sec`, capped at
/// `capacity`, and `try_consume` takes one off the top if available.
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, refill_per_sec: u32) -> Self {
        Self {
            tokens: capacity as f64,
            capacity: capacity as f64,
            refill_per_sec: refill_per_sec as f64,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        if elapsed <= 0.0 {
            return;
        }
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    fn try_consume_one(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Reference [`AdmissionQueue`]: a single shared token bucket, keyed
/// nominally by queue name (this server only ever has one queue, named
/// after its own bind endpoint).
pub struct TokenBucketAdmissionQueue {
    bucket: Mutex<TokenBucket>,
    next_token_id: AtomicU64,
}

impl TokenBucketAdmissionQueue {
    pub fn new(capacity: u32, refill_per_sec: u32) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(capacity, refill_per_sec)),
            next_token_id: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl AdmissionQueue for TokenBucketAdmissionQueue {
    async fn ask(&self, _name: &str) -> Option<Token> {
        let admitted = self.bucket.lock().unwrap().try_consume_one();
        if admitted {
            Some(Token::new(self.next_token_id.fetch_add(1, Ordering::Relaxed)))
        } else {
            None
        }
    }

    async fn done(&self, _token: Token) {}
}
