//! Rate limiting for calls against the Discord REST API.
//!
//! Every remote call reserves one unit of budget from a named bucket before it
//! is issued. Buckets are independent per operation (`getChannels`,
//! `getMessages`, ...), refill on a fixed window, and can be tightened after
//! the fact from the `x-ratelimit-*` headers Discord returns.
//!
//! The limiter is an explicit object shared by handle (`Arc<RateLimiter>`)
//! rather than ambient state, and all waiting goes through an injected
//! [`Clock`] so that pacing is deterministic under test.
//!
//! ```rust,ignore
//! use guildscout_rate_limit::{RateLimiter, RateLimitConfig};
//!
//! let limiter = RateLimiter::new(RateLimitConfig::default());
//! let reservation = limiter.check_rate_limit("getChannels").await?;
//! reservation.increment();
//! // issue the request...
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bucket;
mod clock;
mod config;
mod error;
mod headers;
mod limiter;

pub use bucket::RateLimitBucket;
pub use clock::{Clock, ManualClock, TokioClock};
pub use config::{BucketConfig, RateLimitConfig};
pub use error::{RateLimitError, RateLimitErrorKind, RateLimitResult};
pub use headers::RateLimitHeaders;
pub use limiter::{RateLimiter, Reservation};
