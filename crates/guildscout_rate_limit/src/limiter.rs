//! Shared rate limiter enforcing named per-operation buckets.
//!
//! The limiter coordinates two layers:
//! - **Buckets**: one fixed-window budget per operation name, each guarded by
//!   its own async mutex. Exhausting `getMessages` never blocks
//!   `getChannels`.
//! - **Global ceiling** (optional): a governor GCRA quota in calls per second
//!   applied before any bucket is consulted.

use crate::{Clock, RateLimitBucket, RateLimitConfig, RateLimitError, RateLimitErrorKind};
use crate::{BucketConfig, RateLimitHeaders, RateLimitResult, TokioClock};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, instrument, warn};

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;
type BucketHandle = Arc<AsyncMutex<RateLimitBucket>>;

/// Buckets created on demand for operations that have no configured budget
/// but were told to back off by the remote side.
const UNBOUNDED_BUCKET: BucketConfig = BucketConfig {
    max_requests: u32::MAX,
    window_secs: 1,
};

/// Rate limiter shared by every call made during a discovery run.
///
/// Share it by handle (`Arc<RateLimiter>`) between the list call and every
/// probe. Reserving budget is a two-step protocol whose steps execute as one
/// uninterrupted region per bucket:
///
/// ```rust,ignore
/// let reservation = limiter.check_rate_limit("getMessages").await?; // may wait
/// reservation.increment();                                          // consume one unit
/// let response = transport.request(&request).await;                 // then call
/// ```
///
/// The bucket stays locked from `check_rate_limit` until the reservation is
/// incremented or dropped, so two callers can never both pass the check on
/// the last unit of budget.
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, BucketHandle>>,
    global: Option<Arc<DirectRateLimiter>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter running on the Tokio clock.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(TokioClock))
    }

    /// Create a limiter on an injected clock.
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let global = config
            .global_per_second
            .and_then(NonZeroU32::new)
            .map(|n| Arc::new(GovernorRateLimiter::direct(Quota::per_second(n))));

        debug!(
            buckets = config.buckets.len(),
            has_default = config.default_bucket.is_some(),
            global_per_second = ?config.global_per_second,
            "Creating rate limiter"
        );

        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
            global,
            clock,
        }
    }

    /// Configuration this limiter was built from.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Clock used for all waits.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Wait until `operation` has budget and lock its bucket.
    ///
    /// Suspends the caller while the bucket is empty. With a maximum wait
    /// configured, a refill further away than that fails with
    /// [`RateLimitErrorKind::LimitExceeded`] instead.
    ///
    /// The returned [`Reservation`] holds the bucket until it is incremented
    /// or dropped; dropping it without incrementing consumes nothing.
    #[instrument(skip(self))]
    pub async fn check_rate_limit(&self, operation: &str) -> RateLimitResult<Reservation> {
        if let Some(global) = &self.global {
            global.until_ready().await;
        }

        let Some(handle) = self.bucket_handle(operation, false) else {
            debug!("No rate limit configured for operation");
            return Ok(Reservation {
                operation: operation.to_string(),
                bucket: None,
                clock: self.clock(),
            });
        };

        let mut bucket = handle.lock_owned().await;
        loop {
            let Some(wait) = bucket.wait_time(self.clock.now()) else {
                break;
            };
            if let Some(max_wait) = self.config.max_wait()
                && wait > max_wait
            {
                warn!(?wait, ?max_wait, "Rate limit wait exceeds maximum");
                return Err(RateLimitError::new(RateLimitErrorKind::LimitExceeded {
                    operation: operation.to_string(),
                    wait,
                    max_wait,
                }));
            }
            debug!(?wait, "Bucket exhausted, waiting for refill");
            self.clock.sleep(wait).await;
        }

        debug!(remaining = *bucket.remaining(), "Rate limit check passed");
        Ok(Reservation {
            operation: operation.to_string(),
            bucket: Some(bucket),
            clock: self.clock(),
        })
    }

    /// Check and consume one unit in a single step.
    ///
    /// Returns the units left in the bucket, or `None` for unlimited
    /// operations.
    pub async fn reserve(&self, operation: &str) -> RateLimitResult<Option<u32>> {
        Ok(self.check_rate_limit(operation).await?.increment())
    }

    /// Tighten the bucket from headers observed on a response.
    #[instrument(skip(self, headers), fields(remote_remaining = ?headers.remaining))]
    pub async fn observe(&self, operation: &str, headers: &RateLimitHeaders) {
        let Some(remote) = headers.remaining else {
            return;
        };
        let Some(handle) = self.bucket_handle(operation, remote == 0) else {
            return;
        };
        let mut bucket = handle.lock().await;
        bucket.lower_remaining(remote, headers.reset_after, self.clock.now());
        debug!(remaining = *bucket.remaining(), "Applied remote rate limit observation");
    }

    /// Hold `operation` empty for `retry_after`.
    ///
    /// Used when the remote API answered 429. Applies even to operations
    /// without a configured budget.
    #[instrument(skip(self))]
    pub async fn defer(&self, operation: &str, retry_after: Duration) {
        let Some(handle) = self.bucket_handle(operation, true) else {
            return;
        };
        let mut bucket = handle.lock().await;
        bucket.exhaust_until(self.clock.now() + retry_after);
        debug!("Deferred bucket after remote rate limit");
    }

    /// Units currently left for `operation`, or `None` if it is unlimited.
    pub async fn remaining(&self, operation: &str) -> Option<u32> {
        let handle = self.bucket_handle(operation, false)?;
        let mut bucket = handle.lock().await;
        bucket.refresh(self.clock.now());
        Some(*bucket.remaining())
    }

    fn bucket_handle(&self, operation: &str, create_unbounded: bool) -> Option<BucketHandle> {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = buckets.get(operation) {
            return Some(Arc::clone(handle));
        }
        let config = match self.config.bucket_for(operation) {
            Some(config) => *config,
            None if create_unbounded => UNBOUNDED_BUCKET,
            None => return None,
        };
        let handle = Arc::new(AsyncMutex::new(RateLimitBucket::new(operation, &config)));
        buckets.insert(operation.to_string(), Arc::clone(&handle));
        Some(handle)
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .field("global", &self.global.is_some())
            .field("clock", &self.clock)
            .finish()
    }
}

/// Exclusive hold on a bucket that passed its rate limit check.
///
/// Call [`Reservation::increment`] immediately before issuing the network
/// call so that a failure between the two can only over-count usage.
pub struct Reservation {
    operation: String,
    bucket: Option<OwnedMutexGuard<RateLimitBucket>>,
    clock: Arc<dyn Clock>,
}

impl Reservation {
    /// Operation this reservation was taken for.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Units left before incrementing, or `None` for unlimited operations.
    pub fn remaining(&self) -> Option<u32> {
        self.bucket.as_ref().map(|bucket| *bucket.remaining())
    }

    /// Consume one unit and release the bucket.
    ///
    /// Returns the units left afterwards.
    pub fn increment(self) -> Option<u32> {
        let now = self.clock.now();
        self.bucket.map(|mut bucket| bucket.consume(now))
    }
}

impl std::fmt::Debug for Reservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation")
            .field("operation", &self.operation)
            .field("remaining", &self.remaining())
            .finish()
    }
}
