//! Layered configuration for the guildscout binary.
//!
//! Sources in order of precedence (later sources override earlier):
//! 1. Bundled defaults (`guildscout.toml` shipped with the crate)
//! 2. `~/.config/guildscout/guildscout.toml`
//! 3. `./guildscout.toml`
//! 4. An explicit file passed with `--config`
//! 5. Environment variables `GUILDSCOUT__SECTION__KEY`
//!
//! Every file except an explicit `--config` is optional. Bucket names under
//! `[rate_limit.buckets]` are lowercased in every file so that they merge
//! with environment overrides, which always arrive lowercased.

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use guildscout_discord::DiscordConfig;
use guildscout_error::{ConfigError, GuildscoutError, GuildscoutResult};
use guildscout_rate_limit::RateLimitConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../guildscout.toml");

/// Environment variable holding the bot token.
pub const TOKEN_ENV: &str = "DISCORD_TOKEN";

/// Top-level guildscout configuration.
///
/// # Example
///
/// ```no_run
/// use guildscout::GuildscoutConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = GuildscoutConfig::load()?;
/// println!("Probe cooldown: {:?}", config.discord.cooldown());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct GuildscoutConfig {
    /// Shared rate limit budget.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Discord client and discovery settings.
    #[serde(default)]
    pub discord: DiscordConfig,
}

impl GuildscoutConfig {
    /// Load the bundled defaults with user overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be parsed or the merged
    /// configuration is invalid.
    #[instrument]
    pub fn load() -> GuildscoutResult<Self> {
        debug!(
            "Loading configuration with precedence: env > current dir > home dir > bundled defaults"
        );
        Self::build(Self::layered(&Self::user_layers())?)
    }

    /// Like [`GuildscoutConfig::load`], with `path` layered over the user
    /// files.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not exist or any source is invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_with_file(path: impl AsRef<Path>) -> GuildscoutResult<Self> {
        let explicit = read_source(path.as_ref())?;
        let builder = Self::layered(&Self::user_layers())?
            .add_source(File::from_str(&explicit, FileFormat::Toml));
        Self::build(builder)
    }

    /// Bundled defaults overlaid with the optional files in `layers`, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be parsed or the merged
    /// configuration is invalid.
    pub fn from_layers(layers: &[PathBuf]) -> GuildscoutResult<Self> {
        Self::build(Self::layered(layers)?)
    }

    /// Load a single configuration file, without bundled defaults.
    ///
    /// Missing keys fall back to the built-in defaults of each section.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> GuildscoutResult<Self> {
        debug!("Loading configuration from file");
        let source = read_source(path.as_ref())?;
        Self::build(Config::builder().add_source(File::from_str(&source, FileFormat::Toml)))
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn to_toml(&self) -> GuildscoutResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            GuildscoutError::from(ConfigError::new(format!(
                "Failed to serialize configuration: {}",
                e
            )))
        })
    }

    fn user_layers() -> Vec<PathBuf> {
        let mut layers = Vec::new();
        if let Some(home) = dirs::home_dir() {
            layers.push(home.join(".config/guildscout/guildscout.toml"));
        }
        layers.push(PathBuf::from("guildscout.toml"));
        layers
    }

    fn layered(layers: &[PathBuf]) -> GuildscoutResult<ConfigBuilder<DefaultState>> {
        let defaults = normalize_source(DEFAULT_CONFIG, "bundled defaults")?;
        let mut builder =
            Config::builder().add_source(File::from_str(&defaults, FileFormat::Toml));
        for layer in layers.iter().filter(|layer| layer.is_file()) {
            debug!(path = %layer.display(), "Adding configuration layer");
            let source = read_source(layer)?;
            builder = builder.add_source(File::from_str(&source, FileFormat::Toml));
        }
        Ok(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> GuildscoutResult<Self> {
        let config: Self = builder
            .add_source(
                Environment::with_prefix("GUILDSCOUT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                GuildscoutError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                GuildscoutError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that could never complete a run.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> GuildscoutResult<()> {
        self.rate_limit.validate()?;
        if self.discord.probe_page_size == 0 || self.discord.probe_page_size > 100 {
            return Err(
                ConfigError::new("discord.probe_page_size must be between 1 and 100").into(),
            );
        }
        if self.discord.request_timeout_secs == 0 {
            return Err(
                ConfigError::new("discord.request_timeout_secs must be greater than zero").into(),
            );
        }
        Ok(())
    }
}

fn read_source(path: &Path) -> GuildscoutResult<String> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        GuildscoutError::from(ConfigError::new(format!(
            "Failed to read configuration from {}: {}",
            path.display(),
            e
        )))
    })?;
    normalize_source(&raw, &path.display().to_string())
}

/// Lowercase the bucket names of one TOML source.
fn normalize_source(raw: &str, origin: &str) -> GuildscoutResult<String> {
    let mut table: toml::Table = toml::from_str(raw).map_err(|e| {
        GuildscoutError::from(ConfigError::new(format!(
            "Failed to parse configuration from {}: {}",
            origin, e
        )))
    })?;

    if let Some(toml::Value::Table(rate_limit)) = table.get_mut("rate_limit")
        && let Some(toml::Value::Table(buckets)) = rate_limit.get_mut("buckets")
    {
        *buckets = std::mem::take(buckets)
            .into_iter()
            .map(|(name, bucket)| (name.to_ascii_lowercase(), bucket))
            .collect();
    }

    toml::to_string(&table).map_err(|e| {
        GuildscoutError::from(ConfigError::new(format!(
            "Failed to normalize configuration from {}: {}",
            origin, e
        )))
    })
}
