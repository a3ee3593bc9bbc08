//! Single-page message fetch.

use crate::{
    ApiRequest, BudgetHint, CallPhase, DiscordConfig, DiscordError, DiscordResult,
    ErrorClassifier, MessagePage, MessagesRequest, Operation, RequestContext, Transport,
    TransportFailure,
};
use guildscout_rate_limit::{RateLimitHeaders, RateLimiter};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Fetches one page of a channel's messages under the shared rate limit.
///
/// There is no pagination loop here; callers follow
/// [`MessagePage::next_cursor`] themselves.
#[derive(Clone)]
pub struct MessageFetcher {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    classifier: ErrorClassifier,
    config: DiscordConfig,
}

impl MessageFetcher {
    /// Create a fetcher sharing `limiter` with the rest of the run.
    pub fn new(
        transport: Arc<dyn Transport>,
        limiter: Arc<RateLimiter>,
        config: DiscordConfig,
    ) -> Self {
        let classifier = ErrorClassifier::new(Arc::clone(&limiter));
        Self {
            transport,
            limiter,
            classifier,
            config,
        }
    }

    /// Fetch the page described by `request`.
    ///
    /// Returns `Ok(None)` when the failure was suppressed for `phase` (for
    /// example a 403 while probing).
    ///
    /// # Errors
    ///
    /// Returns the normalized error for rate-limited, transient and fatal
    /// failures, and when the local budget cannot be refilled in time.
    #[instrument(skip(self, request), fields(channel_id = %request.channel_id(), page_size = request.page_size()))]
    pub async fn fetch(
        &self,
        request: &MessagesRequest,
        phase: CallPhase,
    ) -> DiscordResult<Option<MessagePage>> {
        let url = self.config.messages_url(
            request.channel_id(),
            *request.page_size(),
            request.cursor().as_deref(),
        );
        let context = RequestContext::get_messages(url.clone(), request.channel_id(), phase);
        let api_request =
            ApiRequest::get(url, request.token()).map_err(|e| e.with_context(context.clone()))?;

        let operation = Operation::GetMessages;
        self.limiter
            .check_rate_limit(operation.as_ref())
            .await
            .map_err(|e| DiscordError::from(e).with_context(context.clone()))?
            .increment();

        let response = match self.transport.request(&api_request).await {
            Ok(response) => response,
            Err(failure) => {
                self.classifier.classify(failure, &context).await.into_result()?;
                return Ok(None);
            }
        };

        let rate_limit = RateLimitHeaders::from_headers(&response.headers);
        self.limiter.observe(operation.as_ref(), &rate_limit).await;

        let messages = match response.body {
            Value::Array(messages) => messages,
            other => {
                let failure = TransportFailure::Malformed(format!(
                    "expected an array of messages, got {}",
                    json_type(&other)
                ));
                self.classifier.classify(failure, &context).await.into_result()?;
                return Ok(None);
            }
        };

        let budget = BudgetHint::from_remaining(rate_limit.remaining, self.config.pacing_threshold);
        debug!(count = messages.len(), ?budget, "Fetched messages");

        Ok(Some(MessagePage::new(
            messages,
            *request.page_size(),
            budget,
            rate_limit,
        )))
    }
}

impl std::fmt::Debug for MessageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageFetcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
