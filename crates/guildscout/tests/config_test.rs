//! Tests for layered configuration loading.

use guildscout::{BucketConfig, GuildscoutConfig};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

fn toml_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[test]
fn test_bundled_defaults() {
    let config = GuildscoutConfig::from_layers(&[]).unwrap();

    assert_eq!(config.rate_limit.max_wait(), Some(Duration::from_secs(60)));
    assert_eq!(config.rate_limit.global_per_second, Some(50));
    assert_eq!(
        config.rate_limit.bucket_for("getMessages"),
        Some(&BucketConfig {
            max_requests: 5,
            window_secs: 5
        })
    );
    assert_eq!(config.discord.probe_page_size, 1);
    assert_eq!(config.discord.cooldown(), Duration::from_secs(5));
    assert_eq!(config.discord.api_base, "https://discord.com/api/v10");
}

#[test]
fn test_user_layer_overrides_only_what_it_names() {
    let user = toml_file(
        r#"
[discord]
cooldown_secs = 10

[rate_limit.buckets.getMessages]
max_requests = 2
window_secs = 1
"#,
    );

    let config = GuildscoutConfig::from_layers(&[user.path().to_path_buf()]).unwrap();

    assert_eq!(config.discord.cooldown(), Duration::from_secs(10));
    assert_eq!(config.discord.max_retries, 3);
    assert_eq!(
        config.rate_limit.bucket_for("getMessages"),
        Some(&BucketConfig {
            max_requests: 2,
            window_secs: 1
        })
    );
    assert_eq!(
        config.rate_limit.bucket_for("getChannels"),
        Some(&BucketConfig {
            max_requests: 10,
            window_secs: 10
        })
    );
}

#[test]
fn test_later_layers_win() {
    let first = toml_file("[discord]\ncooldown_secs = 7\npacing_threshold = 2\n");
    let second = toml_file("[discord]\ncooldown_secs = 9\n");

    let config = GuildscoutConfig::from_layers(&[
        first.path().to_path_buf(),
        second.path().to_path_buf(),
    ])
    .unwrap();

    assert_eq!(config.discord.cooldown_secs, 9);
    assert_eq!(config.discord.pacing_threshold, 2);
}

#[test]
fn test_missing_optional_layer_is_skipped() {
    let config =
        GuildscoutConfig::from_layers(&[PathBuf::from("/nonexistent/guildscout.toml")]).unwrap();
    assert_eq!(config, GuildscoutConfig::from_layers(&[]).unwrap());
}

#[test]
fn test_explicit_file_must_exist() {
    assert!(GuildscoutConfig::load_with_file("/nonexistent/guildscout.toml").is_err());
}

#[test]
fn test_invalid_settings_are_rejected() {
    let zero_page = toml_file("[discord]\nprobe_page_size = 0\n");
    let err = GuildscoutConfig::from_layers(&[zero_page.path().to_path_buf()]).unwrap_err();
    assert!(err.to_string().contains("probe_page_size"));

    let zero_budget = toml_file("[rate_limit.buckets.getChannels]\nmax_requests = 0\nwindow_secs = 10\n");
    assert!(GuildscoutConfig::from_layers(&[zero_budget.path().to_path_buf()]).is_err());
}

#[test]
fn test_single_file_without_bundled_defaults() {
    let file = toml_file("[discord]\ncooldown_secs = 3\n");

    let config = GuildscoutConfig::from_file(file.path()).unwrap();

    assert_eq!(config.discord.cooldown_secs, 3);
    assert!(config.rate_limit.buckets.is_empty());
    assert_eq!(config.rate_limit.max_wait(), None);
}

#[test]
fn test_rendered_toml_loads_back() {
    let config = GuildscoutConfig::from_layers(&[]).unwrap();
    let rendered = config.to_toml().unwrap();

    assert!(rendered.contains("[discord]"));
    let reloaded = GuildscoutConfig::from_file(toml_file(&rendered).path()).unwrap();
    assert_eq!(reloaded, config);
}
