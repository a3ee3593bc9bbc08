//! Configuration structures for rate limiting.
//!
//! The limiter is normally configured from the `[rate_limit]` section of
//! `guildscout.toml`:
//!
//! ```toml
//! [rate_limit]
//! max_wait_secs = 60
//! global_per_second = 50
//!
//! [rate_limit.buckets.getMessages]
//! max_requests = 5
//! window_secs = 5
//! ```

use guildscout_error::{ConfigError, GuildscoutError, GuildscoutResult};
use config::{Config, File};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Budget for one named bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct BucketConfig {
    /// Calls allowed per window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

/// Rate limiter configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct RateLimitConfig {
    /// Longest a caller may be suspended waiting for a refill.
    ///
    /// `None` waits for as long as the bucket needs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wait_secs: Option<u64>,

    /// Ceiling across all operations, in calls per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_per_second: Option<u32>,

    /// Bucket used for operations without their own entry.
    ///
    /// Operations with neither an entry nor a default are unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_bucket: Option<BucketConfig>,

    /// Per-operation buckets keyed by lowercased operation name.
    #[serde(default, deserialize_with = "lowercase_keys")]
    pub buckets: HashMap<String, BucketConfig>,
}

fn lowercase_keys<'de, D>(deserializer: D) -> Result<HashMap<String, BucketConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, BucketConfig>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, bucket)| (name.to_ascii_lowercase(), bucket))
        .collect())
}

impl RateLimitConfig {
    /// Add or replace the bucket for `operation`.
    pub fn with_bucket(mut self, operation: impl Into<String>, bucket: BucketConfig) -> Self {
        self.buckets.insert(operation.into().to_ascii_lowercase(), bucket);
        self
    }

    /// Set the maximum wait.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait_secs = Some(max_wait.as_secs());
        self
    }

    /// Bucket configuration that applies to `operation`.
    ///
    /// Names are case-insensitive; environment overrides arrive lowercased.
    pub fn bucket_for(&self, operation: &str) -> Option<&BucketConfig> {
        self.buckets
            .get(&operation.to_ascii_lowercase())
            .or(self.default_bucket.as_ref())
    }

    /// Maximum wait as a duration.
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }

    /// Reject bucket definitions that could never admit a call.
    pub fn validate(&self) -> GuildscoutResult<()> {
        let named = self.buckets.iter().map(|(name, b)| (name.as_str(), b));
        let default = self.default_bucket.iter().map(|b| ("default_bucket", b));
        for (name, bucket) in named.chain(default) {
            if bucket.max_requests == 0 {
                return Err(ConfigError::new(format!(
                    "Bucket '{}' must allow at least one request",
                    name
                ))
                .into());
            }
            if bucket.window_secs == 0 {
                return Err(ConfigError::new(format!(
                    "Bucket '{}' must have a window of at least one second",
                    name
                ))
                .into());
            }
        }
        if self.global_per_second == Some(0) {
            return Err(ConfigError::new("global_per_second must be greater than zero").into());
        }
        Ok(())
    }

    /// Load a standalone rate limit configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> GuildscoutResult<Self> {
        debug!("Loading rate limit configuration from file");

        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                GuildscoutError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
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
}
