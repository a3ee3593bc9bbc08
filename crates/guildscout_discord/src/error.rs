//! Discord-specific error types.
//!
//! Every error that leaves a discovery run is a [`DiscordError`]: the kind of
//! failure, the context of the request that failed, and the location in this
//! crate where the failure was normalized.

use crate::RequestContext;
use derive_getters::Getters;
use guildscout_error::GuildscoutError;
use guildscout_rate_limit::{RateLimitError, RateLimitErrorKind};
use std::fmt;

/// Discord error variants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum DiscordErrorKind {
    /// Discord answered 429.
    #[display("Rate limited by Discord (retry after {retry_after_ms}ms, global: {global})")]
    RateLimited {
        /// Wait requested by Discord in milliseconds.
        retry_after_ms: u64,
        /// Whether the global limit was hit.
        global: bool,
    },

    /// The local budget cannot be refilled within the allowed wait.
    #[display("Rate limit exceeded for {operation} (refill in {wait_ms}ms)")]
    RateLimitExceeded {
        /// Exhausted bucket.
        operation: String,
        /// Time until refill in milliseconds.
        wait_ms: u64,
    },

    /// Bot token is invalid or expired.
    #[display("Invalid or expired bot token")]
    InvalidToken,

    /// Non-success HTTP status.
    #[display("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Discord's error message, or the raw body.
        message: String,
    },

    /// Connection, timeout or I/O failure.
    #[display("Network error: {_0}")]
    Network(String),

    /// Response body did not have the expected shape.
    #[display("Malformed response: {_0}")]
    MalformedResponse(String),

    /// Transient failures persisted past the retry budget.
    #[display("Giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
        /// Last failure seen.
        last: String,
    },

    /// HTTP client could not be constructed.
    #[display("HTTP client error: {_0}")]
    HttpClient(String),

    /// Configuration error (missing token, invalid settings).
    #[display("Configuration error: {_0}")]
    ConfigurationError(String),
}

/// Discord error with request context and source location tracking.
#[derive(Debug, Clone, Getters)]
pub struct DiscordError {
    kind: DiscordErrorKind,
    context: Option<RequestContext>,
    line: u32,
    file: &'static str,
}

impl DiscordError {
    /// Create a new DiscordError with automatic location tracking.
    ///
    /// # Example
    /// ```
    /// use guildscout_discord::{DiscordError, DiscordErrorKind};
    ///
    /// let err = DiscordError::new(DiscordErrorKind::InvalidToken);
    /// assert!(err.to_string().contains("Invalid or expired bot token"));
    /// ```
    #[track_caller]
    pub fn new(kind: DiscordErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            context: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Attach the context of the failing request.
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }

    /// True for 429 answers and exhausted local budget.
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self.kind,
            DiscordErrorKind::RateLimited { .. } | DiscordErrorKind::RateLimitExceeded { .. }
        )
    }
}

impl fmt::Display for DiscordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Discord Error: {}", self.kind)?;
        if let Some(context) = &self.context {
            write!(f, " [{}]", context)?;
        }
        write!(f, " at line {} in {}", self.line, self.file)
    }
}

impl std::error::Error for DiscordError {}

/// Result type for Discord operations.
pub type DiscordResult<T> = Result<T, DiscordError>;

impl From<RateLimitError> for DiscordError {
    #[track_caller]
    fn from(err: RateLimitError) -> Self {
        let RateLimitErrorKind::LimitExceeded {
            operation, wait, ..
        } = err.kind();
        DiscordError::new(DiscordErrorKind::RateLimitExceeded {
            operation: operation.clone(),
            wait_ms: u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

impl From<GuildscoutError> for DiscordError {
    #[track_caller]
    fn from(err: GuildscoutError) -> Self {
        DiscordError::new(DiscordErrorKind::HttpClient(err.to_string()))
    }
}
