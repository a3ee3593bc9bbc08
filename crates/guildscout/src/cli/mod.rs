//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the guildscout binary.

mod commands;
mod config;
mod discover;

pub use commands::{Cli, Commands};
pub use config::{load_config, show_config};
pub use discover::run_discover;
