//! Discord channel discovery for Guildscout.
//!
//! Lists every channel of a guild and, optionally, keeps only the channels
//! the caller can actually read by fetching a single message from each.
//!
//! # Architecture
//!
//! - **transport**: the request/response seam ([`Transport`]) and its
//!   reqwest implementation
//! - **classifier**: one decision surface turning failed calls into
//!   rate-limited, retryable, suppressed or fatal outcomes
//! - **messages**: the single-page message fetch
//! - **probe**: readability triage built on the message fetch
//! - **discovery**: the list / probe-filter / pacing orchestrator
//!
//! Every call reserves budget from a shared
//! [`guildscout_rate_limit::RateLimiter`] before it is issued.
//!
//! # Usage
//!
//! ```rust,ignore
//! use guildscout_discord::{ChannelDiscovery, DiscordConfig, GetChannelsRequest};
//! use guildscout_rate_limit::{RateLimitConfig, RateLimiter};
//! use std::sync::Arc;
//!
//! let limiter = Arc::new(RateLimiter::new(RateLimitConfig::default()));
//! let discovery = ChannelDiscovery::from_config(DiscordConfig::default(), limiter)?;
//! let request = GetChannelsRequest::new("81384788765712384", std::env::var("DISCORD_TOKEN")?);
//! let channels = discovery.discover(&request, true).await?;
//! ```

#![warn(missing_docs)]

mod classifier;
mod config;
mod context;
mod discovery;
mod error;
mod messages;
mod models;
mod probe;
mod transport;

pub use classifier::{Classification, ClassificationKind, ErrorClassifier};
pub use config::DiscordConfig;
pub use context::{CallPhase, Operation, RequestContext};
pub use discovery::ChannelDiscovery;
pub use error::{DiscordError, DiscordErrorKind, DiscordResult};
pub use messages::MessageFetcher;
pub use models::{
    BudgetHint, DiscordChannel, GetChannelsRequest, MessagePage, MessagesRequest,
    MessagesRequestBuilder, MessagesRequestBuilderError, ProbeResult,
};
pub use probe::MessageProbe;
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport, TransportFailure};
