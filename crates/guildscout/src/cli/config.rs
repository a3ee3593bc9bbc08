//! Configuration command handler.

use guildscout::{GuildscoutConfig, GuildscoutResult};
use std::path::Path;

/// Load the layered configuration, with `path` on top when given.
pub fn load_config(path: Option<&Path>) -> GuildscoutResult<GuildscoutConfig> {
    match path {
        Some(path) => GuildscoutConfig::load_with_file(path),
        None => GuildscoutConfig::load(),
    }
}

/// Print the effective configuration.
pub fn show_config(config: &GuildscoutConfig) -> GuildscoutResult<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
