//! Guildscout - Discord channel discovery
//!
//! Guildscout lists the channels of a Discord guild and, optionally, keeps
//! only the channels a bot token can actually read. Every call draws from a
//! shared, per-operation rate limit budget, and every failure passes through
//! one classification layer that decides whether it is retried, absorbed, or
//! surfaced.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use guildscout::{ChannelDiscovery, GetChannelsRequest, GuildscoutConfig, RateLimiter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GuildscoutConfig::load()?;
//!     let limiter = Arc::new(RateLimiter::new(config.rate_limit));
//!     let discovery = ChannelDiscovery::from_config(config.discord, limiter)?;
//!
//!     let request = GetChannelsRequest::new("81384788765712384", std::env::var("DISCORD_TOKEN")?);
//!     for channel in discovery.discover(&request, true).await? {
//!         println!("{} {}", channel.id(), channel.name().unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `observability` - Export spans through OpenTelemetry (stdout exporter,
//!   interleaved with `--format json` output)
//!
//! # Architecture
//!
//! - `guildscout_error` - Foundation error types
//! - `guildscout_rate_limit` - Shared per-operation rate limiter
//! - `guildscout_discord` - Transport, classification, probing and discovery
//!
//! This crate (`guildscout`) re-exports everything for convenience.

mod config;
pub mod observability;

pub use config::{GuildscoutConfig, TOKEN_ENV};
pub use guildscout_discord::*;
pub use guildscout_error::*;
pub use guildscout_rate_limit::*;
