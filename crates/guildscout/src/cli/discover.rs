//! Discovery command handler.

use super::commands::OutputFormat;
use guildscout::{
    ChannelDiscovery, ConfigError, DiscordChannel, GetChannelsRequest, GuildscoutConfig,
    JsonError, RateLimiter, TOKEN_ENV,
};
use std::sync::Arc;
use tracing::info;

/// Run one discovery and print the resulting channels.
pub async fn run_discover(
    config: GuildscoutConfig,
    guild: &str,
    token: Option<String>,
    probe: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = token.filter(|t| !t.trim().is_empty()).ok_or_else(|| {
        ConfigError::new(format!("No token: pass --token or set {}", TOKEN_ENV))
    })?;

    let limiter = Arc::new(RateLimiter::new(config.rate_limit));
    let discovery = ChannelDiscovery::from_config(config.discord, limiter)?;

    info!(guild, probe, "Starting channel discovery");
    let channels = discovery
        .discover(&GetChannelsRequest::new(guild, token), probe)
        .await?;

    print_channels(&channels, guild, format)?;
    Ok(())
}

fn print_channels(
    channels: &[DiscordChannel],
    guild: &str,
    format: OutputFormat,
) -> Result<(), JsonError> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(channels)
                .map_err(|e| JsonError::new(e.to_string()))?;
            println!("{}", json);
        }
        OutputFormat::Human => {
            println!("Channels of guild '{}':", guild);
            println!("{:-<60}", "");
            println!("{:<20}  {:>4}  NAME", "ID", "TYPE");
            for channel in channels {
                let kind = channel
                    .channel_type()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "{:<20}  {:>4}  {}",
                    channel.id(),
                    kind,
                    channel.name().unwrap_or("")
                );
            }
            println!("{:-<60}", "");
            println!("Total: {} channels", channels.len());
        }
    }
    Ok(())
}
