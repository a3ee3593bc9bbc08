//! Discord client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the Discord REST client and the discovery loop.
///
/// Loaded from the `[discord]` section of `guildscout.toml`. Every field has
/// a default, so an empty section is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// REST API base URL, without a trailing slash.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// `User-Agent` sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Messages fetched by a readability probe.
    #[serde(default = "default_probe_page_size")]
    pub probe_page_size: u32,

    /// Pause after a probe that left the budget nearly exhausted.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Remaining budget at or below which a probe triggers the cooldown.
    #[serde(default = "default_pacing_threshold")]
    pub pacing_threshold: u32,

    /// Retries for transient failures of the channel list.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Backoff delay cap in seconds.
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_user_agent() -> String {
    format!(
        "DiscordBot ({}, {})",
        env!("CARGO_PKG_REPOSITORY"),
        env!("CARGO_PKG_VERSION")
    )
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_probe_page_size() -> u32 {
    1
}

fn default_cooldown_secs() -> u64 {
    5
}

fn default_pacing_threshold() -> u32 {
    1
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_secs() -> u64 {
    10
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            probe_page_size: default_probe_page_size(),
            cooldown_secs: default_cooldown_secs(),
            pacing_threshold: default_pacing_threshold(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

impl DiscordConfig {
    /// Point the client at a different API base (tests, proxies).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Cooldown as a duration.
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// Request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// URL listing a guild's channels.
    pub fn channels_url(&self, guild_id: &str) -> String {
        format!("{}/guilds/{}/channels", self.api_base, guild_id)
    }

    /// URL fetching one page of a channel's messages.
    pub fn messages_url(&self, channel_id: &str, page_size: u32, before: Option<&str>) -> String {
        let mut url = format!(
            "{}/channels/{}/messages?limit={}",
            self.api_base, channel_id, page_size
        );
        if let Some(before) = before {
            url.push_str("&before=");
            url.push_str(before);
        }
        url
    }
}
