//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Guildscout - list the readable channels of a Discord guild
#[derive(Parser, Debug)]
#[command(name = "guildscout")]
#[command(about = "List the readable channels of a Discord guild", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file layered over the defaults and user files
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List a guild's channels, filtered to the readable ones
    Discover {
        /// Guild ID
        #[arg(long)]
        guild: String,

        /// Authorization header value, including its scheme (`Bot ...`)
        #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Return every listed channel without probing
        #[arg(long)]
        no_probe: bool,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
