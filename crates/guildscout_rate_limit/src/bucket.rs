//! Fixed-window budget for one named operation.

use crate::BucketConfig;
use derive_getters::Getters;
use std::time::Duration;
use tokio::time::Instant;

/// Remaining-call budget for a single operation.
///
/// The window opens on the first unit consumed after a refill. Once
/// `reset_at` has passed the bucket refills to `max_requests`. The remaining
/// count never drops below zero; a caller that finds it at zero must wait
/// for `reset_at`.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct RateLimitBucket {
    /// Operation name this bucket belongs to.
    operation: String,
    /// Units available per window.
    max_requests: u32,
    /// Window length.
    window: Duration,
    /// Units left in the current window.
    remaining: u32,
    /// Instant the current window closes, if one is open.
    reset_at: Option<Instant>,
}

impl RateLimitBucket {
    /// Create a full bucket from its configuration.
    pub fn new(operation: impl Into<String>, config: &BucketConfig) -> Self {
        Self {
            operation: operation.into(),
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            remaining: config.max_requests,
            reset_at: None,
        }
    }

    /// Refill the bucket if its window has closed.
    pub fn refresh(&mut self, now: Instant) {
        if let Some(reset_at) = self.reset_at
            && reset_at <= now
        {
            self.remaining = self.max_requests;
            self.reset_at = None;
        }
    }

    /// Time the caller must wait before a unit is available.
    ///
    /// Returns `None` when a unit can be consumed immediately.
    pub fn wait_time(&mut self, now: Instant) -> Option<Duration> {
        self.refresh(now);
        if self.remaining > 0 {
            return None;
        }
        let reset_at = *self.reset_at.get_or_insert(now + self.window);
        Some(reset_at.saturating_duration_since(now))
    }

    /// Consume one unit, opening the window if needed.
    ///
    /// Returns the units left afterwards.
    pub fn consume(&mut self, now: Instant) -> u32 {
        self.refresh(now);
        if self.reset_at.is_none() {
            self.reset_at = Some(now + self.window);
        }
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }

    /// Hold the bucket empty until at least `until`.
    pub fn exhaust_until(&mut self, until: Instant) {
        self.remaining = 0;
        self.reset_at = Some(match self.reset_at {
            Some(current) if current > until => current,
            _ => until,
        });
    }

    /// Tighten the local count from a remote observation.
    ///
    /// The local count is only ever lowered. A remote count of zero holds the
    /// bucket empty for `reset_after` (or the rest of the window).
    pub fn lower_remaining(&mut self, remote: u32, reset_after: Option<Duration>, now: Instant) {
        self.refresh(now);
        if remote == 0 {
            let until = reset_after
                .map(|after| now + after)
                .or(self.reset_at)
                .unwrap_or(now + self.window);
            self.exhaust_until(until);
            return;
        }
        if remote < self.remaining {
            self.remaining = remote;
            if self.reset_at.is_none() {
                self.reset_at = Some(now + reset_after.unwrap_or(self.window));
            }
        }
    }
}
