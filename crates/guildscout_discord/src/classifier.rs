//! Classification of failed Discord calls.
//!
//! Both the channel list and every probe hand their failures to the same
//! [`ErrorClassifier`], which decides between four outcomes:
//!
//! | Outcome       | When                                        | Caller policy                 |
//! |---------------|---------------------------------------------|-------------------------------|
//! | `RateLimited` | 429                                         | wait the hint, retry once     |
//! | `Retryable`   | 408, 5xx gateway/server errors, network     | bounded backoff               |
//! | `Suppressed`  | 403/404 while probing                       | treat as a negative answer    |
//! | `Fatal`       | everything else                             | propagate unchanged           |
//!
//! A 429's retry-after hint is pushed into the shared rate limiter, so the
//! next reservation on that bucket waits it out.

use crate::{CallPhase, DiscordError, DiscordErrorKind, RequestContext, TransportFailure};
use guildscout_rate_limit::{RateLimitHeaders, RateLimiter};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Fallback wait for a 429 that carries no usable hint.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Longest body excerpt kept in an error message.
const MAX_BODY_EXCERPT: usize = 256;

/// Discriminant of a [`Classification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationKind {
    /// Remote rate limit.
    RateLimited,
    /// Transient failure.
    Retryable,
    /// Expected negative answer.
    Suppressed,
    /// Anything else.
    Fatal,
}

/// Result of classifying one failed call.
#[derive(Debug, Clone)]
pub enum Classification {
    /// Discord answered 429.
    RateLimited {
        /// How long Discord asked us to wait.
        retry_after: Duration,
        /// Normalized error, surfaced if the retry also fails.
        error: DiscordError,
    },
    /// Transient network or server failure.
    Retryable(DiscordError),
    /// Safe to ignore in this phase; there is no error to report.
    Suppressed,
    /// Must be propagated to the caller.
    Fatal(DiscordError),
}

impl Classification {
    /// Discriminant of this outcome.
    pub fn kind(&self) -> ClassificationKind {
        match self {
            Self::RateLimited { .. } => ClassificationKind::RateLimited,
            Self::Retryable(_) => ClassificationKind::Retryable,
            Self::Suppressed => ClassificationKind::Suppressed,
            Self::Fatal(_) => ClassificationKind::Fatal,
        }
    }

    /// The normalized error, absent for suppressed failures.
    pub fn error(&self) -> Option<&DiscordError> {
        match self {
            Self::RateLimited { error, .. } | Self::Retryable(error) | Self::Fatal(error) => {
                Some(error)
            }
            Self::Suppressed => None,
        }
    }

    /// `Ok(())` for suppressed failures, the normalized error otherwise.
    pub fn into_result(self) -> Result<(), DiscordError> {
        match self {
            Self::RateLimited { error, .. } | Self::Retryable(error) | Self::Fatal(error) => {
                Err(error)
            }
            Self::Suppressed => Ok(()),
        }
    }
}

/// Discord's JSON error body.
#[derive(Debug, Default, Deserialize)]
struct DiscordErrorBody {
    #[serde(default)]
    code: Option<u64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    retry_after: Option<f64>,
    #[serde(default)]
    global: Option<bool>,
}

impl DiscordErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn describe(&self, raw: &str) -> String {
        match (&self.message, self.code) {
            (Some(message), Some(code)) => format!("{} (code {})", message, code),
            (Some(message), None) => message.clone(),
            _ => excerpt(raw),
        }
    }
}

fn excerpt(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "empty body".to_string();
    }
    match trimmed.char_indices().nth(MAX_BODY_EXCERPT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Single decision surface for failed calls.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    limiter: Arc<RateLimiter>,
}

impl ErrorClassifier {
    /// Create a classifier feeding rate limit hints into `limiter`.
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    /// Classify `failure` for the request described by `context`.
    #[instrument(skip(self, failure), fields(operation = %context.operation(), phase = %context.phase(), url = %context.url()))]
    pub async fn classify(
        &self,
        failure: TransportFailure,
        context: &RequestContext,
    ) -> Classification {
        let classification = match failure {
            TransportFailure::Network(message) => Classification::Retryable(
                DiscordError::new(DiscordErrorKind::Network(message)).with_context(context.clone()),
            ),
            TransportFailure::Malformed(message) => Classification::Fatal(
                DiscordError::new(DiscordErrorKind::MalformedResponse(message))
                    .with_context(context.clone()),
            ),
            TransportFailure::Status {
                status,
                headers,
                body,
            } => {
                let parsed = DiscordErrorBody::parse(&body);
                match status {
                    429 => {
                        let rate_limit = RateLimitHeaders::from_headers(&headers);
                        let retry_after = parsed
                            .retry_after
                            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                            .or(rate_limit.retry_after)
                            .or(rate_limit.reset_after)
                            .unwrap_or(DEFAULT_RETRY_AFTER);
                        let global = parsed.global.unwrap_or(false) || rate_limit.global;

                        self.limiter
                            .defer(context.operation().as_ref(), retry_after)
                            .await;

                        Classification::RateLimited {
                            retry_after,
                            error: DiscordError::new(DiscordErrorKind::RateLimited {
                                retry_after_ms: u64::try_from(retry_after.as_millis())
                                    .unwrap_or(u64::MAX),
                                global,
                            })
                            .with_context(context.clone()),
                        }
                    }
                    408 | 500 | 502 | 503 | 504 => Classification::Retryable(
                        DiscordError::new(DiscordErrorKind::Http {
                            status,
                            message: parsed.describe(&body),
                        })
                        .with_context(context.clone()),
                    ),
                    403 | 404 if *context.phase() == CallPhase::Probe => Classification::Suppressed,
                    401 => Classification::Fatal(
                        DiscordError::new(DiscordErrorKind::InvalidToken)
                            .with_context(context.clone()),
                    ),
                    _ => Classification::Fatal(
                        DiscordError::new(DiscordErrorKind::Http {
                            status,
                            message: parsed.describe(&body),
                        })
                        .with_context(context.clone()),
                    ),
                }
            }
        };

        match &classification {
            Classification::Suppressed => debug!("Failure suppressed"),
            Classification::Retryable(error) => debug!(%error, "Transient failure"),
            Classification::RateLimited { retry_after, .. } => {
                warn!(?retry_after, "Rate limited by Discord")
            }
            Classification::Fatal(error) => warn!(%error, "Fatal failure"),
        }

        classification
    }
}
