//! Throttles - rate limiters pacing each cycle's publishes.
//!
//! All throttles are token buckets that start empty and gain one token per
//! interval up to `burst`. They differ only in how the interval is chosen:
//!
//! | Constructor | Interval |
//! |-------------|----------|
//! | `fixed` | the configured interval |
//! | `dynamic` | `max(window / publishes, minimum)` |
//! | `capped_dynamic` | `window / publishes` clamped to `[minimum, maximum]` |
//!
//! A throttle is bound to a cancellation token derived from its cycle;
//! cancelling it (or calling [`Throttle::stop`]) releases every waiter.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Smallest interval a throttle will pace at.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Errors returned while waiting on a throttle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThrottleError {
    #[error("Throttle was stopped")]
    Cancelled,
}

/// A rate limiter whose `queue` call blocks until the next permit.
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Waits for a permit; returns `Cancelled` without consuming one when stopped.
    async fn queue(&self) -> Result<(), ThrottleError>;

    /// Time between permits.
    fn interval(&self) -> Duration;

    /// Stops the throttle, releasing any waiter.
    fn stop(&self);
}

/// `max(window / publishes, minimum)`.
pub fn dynamic_interval(window: Duration, minimum: Duration, publishes: u64) -> Duration {
    even_spacing(window, publishes).max(minimum)
}

/// `window / publishes` clamped to `[minimum, maximum]`.
pub fn capped_dynamic_interval(
    window: Duration,
    minimum: Duration,
    maximum: Duration,
    publishes: u64,
) -> Duration {
    even_spacing(window, publishes).max(minimum).min(maximum.max(minimum))
}

fn even_spacing(window: Duration, publishes: u64) -> Duration {
    let publishes = publishes.max(1) as u128;
    let nanos = window.as_nanos() / publishes;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    next_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant, interval: Duration, burst: u32) {
        if now < self.next_refill {
            return;
        }
        let overdue = (now - self.next_refill).as_nanos() / interval.as_nanos();
        let ticks = u32::try_from(overdue.saturating_add(1)).unwrap_or(u32::MAX);
        self.tokens = self.tokens.saturating_add(ticks).min(burst);
        self.next_refill += interval.saturating_mul(ticks);
    }
}

/// Token bucket throttle.
#[derive(Debug)]
pub struct TokenBucketThrottle {
    interval: Duration,
    burst: u32,
    bucket: Mutex<Bucket>,
    cancel: CancellationToken,
}

impl TokenBucketThrottle {
    /// One permit every `interval`, holding at most `burst`.
    pub fn fixed(interval: Duration, burst: u32, cancel: CancellationToken) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        Self {
            interval,
            burst: burst.max(1),
            bucket: Mutex::new(Bucket {
                tokens: 0,
                next_refill: Instant::now() + interval,
            }),
            cancel,
        }
    }

    /// Spreads `publishes` permits evenly across `window`, never faster than `minimum`.
    pub fn dynamic(
        window: Duration,
        minimum: Duration,
        publishes: u64,
        burst: u32,
        cancel: CancellationToken,
    ) -> Self {
        Self::fixed(dynamic_interval(window, minimum, publishes), burst, cancel)
    }

    /// As [`TokenBucketThrottle::dynamic`], but never slower than `maximum`.
    pub fn capped_dynamic(
        window: Duration,
        minimum: Duration,
        maximum: Duration,
        publishes: u64,
        burst: u32,
        cancel: CancellationToken,
    ) -> Self {
        Self::fixed(
            capped_dynamic_interval(window, minimum, maximum, publishes),
            burst,
            cancel,
        )
    }
}

#[async_trait]
impl Throttle for TokenBucketThrottle {
    async fn queue(&self) -> Result<(), ThrottleError> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(ThrottleError::Cancelled);
            }

            let wake_at = {
                let mut bucket = self.bucket.lock().await;
                bucket.refill(Instant::now(), self.interval, self.burst);
                if bucket.tokens > 0 {
                    bucket.tokens -= 1;
                    return Ok(());
                }
                bucket.next_refill
            };

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(ThrottleError::Cancelled),
                _ = sleep_until(wake_at) => {}
            }
        }
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn stop(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn fixed_throttle_spaces_permits_by_interval() {
        let throttle = TokenBucketThrottle::fixed(Duration::from_secs(1), 1, CancellationToken::new());
        let mut last = Instant::now();

        for _ in 0..4 {
            throttle.queue().await.unwrap();
            let now = Instant::now();
            assert!(now - last >= Duration::from_secs(1));
            last = now;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn idle_time_accrues_at_most_burst_permits() {
        let throttle = TokenBucketThrottle::fixed(Duration::from_secs(1), 2, CancellationToken::new());
        tokio::time::sleep(Duration::from_secs(10)).await;

        let start = Instant::now();
        throttle.queue().await.unwrap();
        throttle.queue().await.unwrap();
        assert_eq!(Instant::now(), start);

        throttle.queue().await.unwrap();
        assert!(Instant::now() > start);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_releases_blocked_caller() {
        let throttle = Arc::new(TokenBucketThrottle::fixed(
            Duration::from_secs(3600),
            1,
            CancellationToken::new(),
        ));
        let waiter = {
            let throttle = throttle.clone();
            tokio::spawn(async move { throttle.queue().await })
        };
        tokio::task::yield_now().await;

        let start = Instant::now();
        throttle.stop();
        let result = waiter.await.unwrap();

        assert_eq!(result, Err(ThrottleError::Cancelled));
        assert!(Instant::now() - start < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_stops_throttle() {
        let parent = CancellationToken::new();
        let throttle = TokenBucketThrottle::fixed(Duration::from_secs(1), 1, parent.child_token());
        parent.cancel();
        assert_eq!(throttle.queue().await, Err(ThrottleError::Cancelled));
    }

    #[test]
    fn scaling_window_examples() {
        let window = Duration::from_secs(60);
        let min = Duration::from_secs(1);
        let max = Duration::from_secs(10);

        assert_eq!(capped_dynamic_interval(window, min, max, 30), Duration::from_secs(2));
        assert_eq!(capped_dynamic_interval(window, min, max, 1_000), min);
        assert_eq!(capped_dynamic_interval(window, min, max, 3), max);
    }

    #[test]
    fn dynamic_interval_has_no_ceiling() {
        let interval = dynamic_interval(Duration::from_secs(60), Duration::from_secs(1), 3);
        assert_eq!(interval, Duration::from_secs(20));
    }

    #[test]
    fn zero_publishes_use_whole_window() {
        let interval = dynamic_interval(Duration::from_secs(60), Duration::from_secs(1), 0);
        assert_eq!(interval, Duration::from_secs(60));
    }

    proptest! {
        #[test]
        fn dynamic_interval_never_below_minimum(window in 0u64..100_000, min in 1u64..10_000, publishes in 0u64..10_000) {
            let interval = dynamic_interval(
                Duration::from_millis(window),
                Duration::from_millis(min),
                publishes,
            );
            prop_assert!(interval >= Duration::from_millis(min));
        }

        #[test]
        fn capped_interval_within_bounds(window in 0u64..100_000, min in 1u64..1_000, extra in 0u64..10_000, publishes in 0u64..10_000) {
            let minimum = Duration::from_millis(min);
            let maximum = Duration::from_millis(min + extra);
            let interval = capped_dynamic_interval(Duration::from_millis(window), minimum, maximum, publishes);
            prop_assert!(interval >= minimum);
            prop_assert!(interval <= maximum);
        }
    }
}
