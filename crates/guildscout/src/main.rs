//! Guildscout CLI binary.
//!
//! This binary provides command-line access to Guildscout's functionality:
//! - Discover the readable channels of a guild
//! - Inspect the effective configuration

use clap::Parser;
use guildscout::observability::{ObservabilityConfig, init_observability_with_config};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, load_config, run_discover, show_config};

    // Load .env before parsing so DISCORD_TOKEN can come from it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // RUST_LOG is the default level; --verbose raises it to DEBUG
    let mut logging = ObservabilityConfig::default().with_json_logs(cli.json_logs);
    if cli.verbose {
        logging = logging.with_log_level("debug");
    }
    init_observability_with_config(logging)?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Discover {
            guild,
            token,
            no_probe,
            format,
        } => {
            run_discover(config, &guild, token, !no_probe, format).await?;
        }

        Commands::Config => {
            show_config(&config)?;
        }
    }

    Ok(())
}
