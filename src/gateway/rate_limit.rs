use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::protocol::ChannelKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Subscribe,
    Chat,
    HandAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct BucketKey {
    user_id: i64,
    channel_kind: ChannelKind,
    action: ActionKind,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Clone, Copy, Debug)]
pub struct BucketLimits {
    pub capacity: f64,
    pub refill_per_sec: f64,
}

/// Token bucket per `(user, channel kind, action type)`. Exceeding a bucket
/// does not disconnect the socket; the caller turns a denial into a
/// structured `rate_limited` error message.
pub struct RateLimiter {
    buckets: DashMap<BucketKey, Bucket>,
    limits: BucketLimits,
}

impl RateLimiter {
    pub fn new(limits: BucketLimits) -> Self {
        Self {
            buckets: DashMap::new(),
            limits,
        }
    }

    /// Attempts to spend one token. On success returns `Ok(())`; on failure
    /// returns the milliseconds the caller should wait before retrying.
    pub fn try_acquire(
        &self,
        user_id: i64,
        channel_kind: ChannelKind,
        action: ActionKind,
    ) -> Result<(), u64> {
        let key = BucketKey {
            user_id,
            channel_kind,
            action,
        };
        let now = Instant::now();
        let mut bucket = self.buckets.entry(key).or_insert_with(|| Bucket {
            tokens: self.limits.capacity,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.limits.refill_per_sec)
            .min(self.limits.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - bucket.tokens;
            let wait_secs = deficit / self.limits.refill_per_sec;
            Err((wait_secs * 1000.0).ceil() as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_allows_burst_up_to_capacity_then_denies() {
        let limiter = RateLimiter::new(BucketLimits {
            capacity: 2.0,
            refill_per_sec: 1.0,
        });

        assert!(limiter
            .try_acquire(1, ChannelKind::Chat, ActionKind::Chat)
            .is_ok());
        assert!(limiter
            .try_acquire(1, ChannelKind::Chat, ActionKind::Chat)
            .is_ok());
        assert!(limiter
            .try_acquire(1, ChannelKind::Chat, ActionKind::Chat)
            .is_err());
    }

    #[test]
    fn buckets_are_independent_per_key() {
        let limiter = RateLimiter::new(BucketLimits {
            capacity: 1.0,
            refill_per_sec: 1.0,
        });

        assert!(limiter
            .try_acquire(1, ChannelKind::Chat, ActionKind::Chat)
            .is_ok());
        assert!(limiter
            .try_acquire(2, ChannelKind::Chat, ActionKind::Chat)
            .is_ok());
    }
}
