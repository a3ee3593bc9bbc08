//! Channel discovery orchestrator.
//!
//! A run has three phases:
//!
//! 1. **List** one rate-limited call for every channel of the guild. Any
//!    failure here is surfaced to the caller after classification.
//! 2. **Probe-filter** (optional) probes each listed channel in order and
//!    keeps the ones that answered with a usable budget.
//! 3. **Pacing** pauses for the configured cooldown after a probe that left
//!    the budget nearly exhausted.
//!
//! Probes run strictly one after another so the output keeps Discord's
//! ordering and the shared budget is drawn from a single caller.

use crate::{
    ApiRequest, Classification, DiscordChannel, DiscordConfig, DiscordError, DiscordErrorKind,
    DiscordResult, ErrorClassifier, GetChannelsRequest, MessageFetcher, MessageProbe, Operation,
    ReqwestTransport, RequestContext, Transport, TransportFailure,
};
use guildscout_rate_limit::{RateLimitHeaders, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, instrument, warn};

/// Lists a guild's channels and optionally filters them to readable ones.
#[derive(Clone)]
pub struct ChannelDiscovery {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    classifier: ErrorClassifier,
    probe: MessageProbe,
    config: DiscordConfig,
}

impl ChannelDiscovery {
    /// Create a discovery run over `transport`, drawing from `limiter`.
    pub fn new(
        transport: Arc<dyn Transport>,
        limiter: Arc<RateLimiter>,
        config: DiscordConfig,
    ) -> Self {
        let classifier = ErrorClassifier::new(Arc::clone(&limiter));
        let fetcher = MessageFetcher::new(
            Arc::clone(&transport),
            Arc::clone(&limiter),
            config.clone(),
        );
        let probe = MessageProbe::new(fetcher, config.probe_page_size);
        Self {
            transport,
            limiter,
            classifier,
            probe,
            config,
        }
    }

    /// Create a discovery run over a reqwest transport built from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: DiscordConfig, limiter: Arc<RateLimiter>) -> DiscordResult<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::new(Arc::new(transport), limiter, config))
    }

    /// Discovery settings.
    pub fn config(&self) -> &DiscordConfig {
        &self.config
    }

    /// The probe used for the filter phase.
    pub fn probe(&self) -> &MessageProbe {
        &self.probe
    }

    /// List the guild's channels and, when `probe_channels` is set, keep only
    /// the readable ones.
    ///
    /// Output order is Discord's order. With probing disabled the full list
    /// is returned unfiltered.
    ///
    /// # Errors
    ///
    /// Returns the normalized error of the list call. Probe failures never
    /// surface here; they only exclude the channel.
    #[instrument(skip(self, request), fields(guild_id = %request.guild_id()))]
    pub async fn discover(
        &self,
        request: &GetChannelsRequest,
        probe_channels: bool,
    ) -> DiscordResult<Vec<DiscordChannel>> {
        let channels = self.list_channels(request).await?;
        info!(count = channels.len(), "Listed guild channels");

        if !probe_channels {
            return Ok(channels);
        }

        let readable = self.filter_readable(channels, request.token()).await;
        info!(count = readable.len(), "Filtered to readable channels");
        Ok(readable)
    }

    /// List every channel of the guild, retrying per the list-phase policy.
    ///
    /// A 429 is retried once after the limiter has waited out the hint.
    /// Transient failures are retried with capped exponential backoff.
    ///
    /// # Errors
    ///
    /// Returns the normalized error once the retry budget is spent, or
    /// immediately for fatal failures.
    #[instrument(skip(self, request), fields(guild_id = %request.guild_id()))]
    pub async fn list_channels(
        &self,
        request: &GetChannelsRequest,
    ) -> DiscordResult<Vec<DiscordChannel>> {
        let url = self.config.channels_url(request.guild_id());
        let context = RequestContext::list_channels(url, request.guild_id());

        let mut backoff = self.backoff();
        let mut rate_limit_retried = false;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match self.list_once(request, &context).await {
                Ok(channels) => return Ok(channels),
                Err(Classification::RateLimited { retry_after, error }) => {
                    if rate_limit_retried {
                        return Err(error);
                    }
                    rate_limit_retried = true;
                    info!(?retry_after, "Retrying channel list after rate limit");
                }
                Err(Classification::Retryable(error)) => match backoff.next() {
                    Some(delay) => {
                        warn!(attempt = attempts, ?delay, error = %error, "Transient failure listing channels, backing off");
                        self.limiter.clock().sleep(delay).await;
                    }
                    None => {
                        return Err(DiscordError::new(DiscordErrorKind::RetriesExhausted {
                            attempts,
                            last: error.kind().to_string(),
                        })
                        .with_context(context));
                    }
                },
                Err(Classification::Suppressed) => {
                    warn!("Channel list failure was suppressed, returning no channels");
                    return Ok(Vec::new());
                }
                Err(Classification::Fatal(error)) => return Err(error),
            }
        }
    }

    async fn list_once(
        &self,
        request: &GetChannelsRequest,
        context: &RequestContext,
    ) -> Result<Vec<DiscordChannel>, Classification> {
        let api_request = ApiRequest::get(context.url().clone(), request.token())
            .map_err(|e| Classification::Fatal(e.with_context(context.clone())))?;

        let operation = Operation::GetChannels;
        self.limiter
            .check_rate_limit(operation.as_ref())
            .await
            .map_err(|e| Classification::Fatal(DiscordError::from(e).with_context(context.clone())))?
            .increment();

        let response = match self.transport.request(&api_request).await {
            Ok(response) => response,
            Err(failure) => return Err(self.classifier.classify(failure, context).await),
        };

        let rate_limit = RateLimitHeaders::from_headers(&response.headers);
        self.limiter.observe(operation.as_ref(), &rate_limit).await;

        match serde_json::from_value::<Vec<DiscordChannel>>(response.body) {
            Ok(channels) => {
                debug!(count = channels.len(), remaining = ?rate_limit.remaining, "Decoded channel list");
                Ok(channels)
            }
            Err(e) => {
                let failure =
                    TransportFailure::Malformed(format!("expected an array of channels: {}", e));
                Err(self.classifier.classify(failure, context).await)
            }
        }
    }

    async fn filter_readable(
        &self,
        channels: Vec<DiscordChannel>,
        token: &str,
    ) -> Vec<DiscordChannel> {
        let total = channels.len();
        let mut readable = Vec::with_capacity(total);

        for (index, channel) in channels.into_iter().enumerate() {
            let result = self.probe.probe(channel.id(), token).await;
            let budget = result.budget();

            if budget.is_usable() {
                debug!(channel_id = channel.id(), ?budget, "Keeping channel");
                readable.push(channel);
            } else {
                debug!(channel_id = channel.id(), ?result, "Excluding channel");
            }

            if budget.needs_cooldown() && index + 1 < total {
                let cooldown = self.config.cooldown();
                info!(?cooldown, ?budget, "Budget nearly exhausted, pausing before next probe");
                self.limiter.clock().sleep(cooldown).await;
            }
        }

        readable
    }

    fn backoff(&self) -> impl Iterator<Item = Duration> + use<> {
        let factor = (self.config.initial_backoff_ms / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(Duration::from_secs(self.config.max_backoff_secs))
            .map(jitter)
            .take(usize::try_from(self.config.max_retries).unwrap_or(usize::MAX))
    }
}

impl std::fmt::Debug for ChannelDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelDiscovery")
            .field("limiter", &self.limiter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
