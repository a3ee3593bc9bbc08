//! Error types for rate limiting operations.

use std::fmt;
use std::time::Duration;

/// Error kinds for rate limiting operations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RateLimitErrorKind {
    /// The wait needed to free budget exceeds the configured maximum.
    LimitExceeded {
        /// Bucket that is exhausted.
        operation: String,
        /// Time until the bucket refills.
        wait: Duration,
        /// Configured maximum wait.
        max_wait: Duration,
    },
}

impl fmt::Display for RateLimitErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitErrorKind::LimitExceeded {
                operation,
                wait,
                max_wait,
            } => write!(
                f,
                "Rate limit exceeded for '{}': refill in {:?} exceeds max wait {:?}",
                operation, wait, max_wait
            ),
        }
    }
}

/// Rate limiting error with location tracking.
#[derive(Debug, Clone)]
pub struct RateLimitError {
    kind: RateLimitErrorKind,
    line: u32,
    file: &'static str,
}

impl RateLimitError {
    /// Create a new rate limiting error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RateLimitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RateLimitErrorKind {
        &self.kind
    }

    /// Time until the exhausted bucket refills, if this is a limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        let RateLimitErrorKind::LimitExceeded { wait, .. } = &self.kind;
        Some(*wait)
    }
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rate Limit Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl std::error::Error for RateLimitError {}

/// Result type for rate limiting operations.
pub type RateLimitResult<T> = Result<T, RateLimitError>;
