//! Parsing of Discord's rate limit response headers.
//!
//! Discord reports per-route budget on every response:
//! - `x-ratelimit-limit`: calls allowed in the current window
//! - `x-ratelimit-remaining`: calls left in the current window
//! - `x-ratelimit-reset`: epoch seconds at which the window resets
//! - `x-ratelimit-reset-after`: seconds (fractional) until the reset
//! - `x-ratelimit-bucket`: opaque bucket hash
//! - `x-ratelimit-global`: present on 429s caused by the global limit
//! - `x-ratelimit-scope`: `user`, `global` or `shared` on 429s
//! - `retry-after`: seconds to wait after a 429

use reqwest::header::HeaderMap;
use std::time::Duration;

/// Rate limit information extracted from one response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitHeaders {
    /// Calls allowed in the current window.
    pub limit: Option<u32>,
    /// Calls left in the current window.
    pub remaining: Option<u32>,
    /// Epoch seconds of the next reset.
    pub reset_at_epoch: Option<f64>,
    /// Time until the next reset.
    pub reset_after: Option<Duration>,
    /// Discord bucket hash.
    pub bucket: Option<String>,
    /// Whether the global limit was hit.
    pub global: bool,
    /// Scope of a 429.
    pub scope: Option<String>,
    /// Wait requested by a 429.
    pub retry_after: Option<Duration>,
}

impl RateLimitHeaders {
    /// Extract rate limit information from a header map.
    ///
    /// Unparsable values are treated as absent.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            limit: parse_header(headers, "x-ratelimit-limit"),
            remaining: parse_header(headers, "x-ratelimit-remaining"),
            reset_at_epoch: parse_header(headers, "x-ratelimit-reset"),
            reset_after: parse_seconds(headers, "x-ratelimit-reset-after"),
            bucket: header_str(headers, "x-ratelimit-bucket").map(str::to_string),
            global: header_str(headers, "x-ratelimit-global")
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
            scope: header_str(headers, "x-ratelimit-scope").map(str::to_string),
            retry_after: parse_seconds(headers, "retry-after"),
        }
    }

    /// True when no rate limit header was present.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, key: &str) -> Option<&'a str> {
    headers.get(key)?.to_str().ok().map(str::trim)
}

fn parse_header<T: std::str::FromStr>(headers: &HeaderMap, key: &str) -> Option<T> {
    header_str(headers, key)?.parse().ok()
}

fn parse_seconds(headers: &HeaderMap, key: &str) -> Option<Duration> {
    let secs: f64 = parse_header(headers, key)?;
    Duration::try_from_secs_f64(secs).ok()
}
