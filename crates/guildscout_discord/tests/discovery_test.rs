//! Tests for the list / probe-filter / pacing orchestrator.

mod test_utils;

use guildscout_discord::{DiscordChannel, DiscordErrorKind, GetChannelsRequest};
use guildscout_rate_limit::{BucketConfig, RateLimitConfig};
use serde_json::json;
use std::time::Duration;
use test_utils::{
    TOKEN, channel_list, channels_url, harness, harness_with, network, ok_json, one_message,
    probe_url, rate_limited, status, test_config,
};

fn request() -> GetChannelsRequest {
    GetChannelsRequest::new("g1", TOKEN)
}

fn ids(channels: &[DiscordChannel]) -> Vec<&str> {
    channels.iter().map(DiscordChannel::id).collect()
}

#[tokio::test]
async fn test_without_probing_returns_full_list_in_order() {
    let h = harness(RateLimitConfig::default());
    h.transport
        .push(channels_url("g1"), ok_json(channel_list(&["c3", "c1", "c2"]), Some(9)));

    let channels = h.discovery.discover(&request(), false).await.unwrap();

    assert_eq!(ids(&channels), vec!["c3", "c1", "c2"]);
    assert_eq!(channels[0].name(), Some("channel-c3"));
    assert_eq!(h.transport.call_urls(), vec![channels_url("g1")]);
}

#[tokio::test]
async fn test_probing_keeps_readable_subsequence_in_order() {
    let h = harness(RateLimitConfig::default());
    h.transport
        .push(
            channels_url("g1"),
            ok_json(channel_list(&["a", "b", "c", "d", "e"]), Some(9)),
        )
        .push(probe_url("a"), ok_json(one_message("a"), Some(5)))
        .push(probe_url("b"), status(403, r#"{"message":"Missing Access","code":50001}"#))
        .push(probe_url("c"), ok_json(one_message("c"), None))
        .push(probe_url("d"), ok_json(one_message("d"), Some(3)))
        .push(probe_url("e"), network("connection reset"));

    let channels = h.discovery.discover(&request(), true).await.unwrap();

    assert_eq!(ids(&channels), vec!["a", "d"]);
    // Every channel was probed, in list order, once
    assert_eq!(
        h.transport.call_urls(),
        vec![
            channels_url("g1"),
            probe_url("a"),
            probe_url("b"),
            probe_url("c"),
            probe_url("d"),
            probe_url("e"),
        ]
    );
}

#[tokio::test]
async fn test_forbidden_channel_is_excluded_and_run_continues() {
    let h = harness(RateLimitConfig::default());
    h.transport
        .push(channels_url("g1"), ok_json(channel_list(&["x", "y"]), Some(9)))
        .push(probe_url("x"), status(403, "{}"))
        .push(probe_url("y"), ok_json(one_message("y"), Some(4)));

    let channels = h.discovery.discover(&request(), true).await.unwrap();

    assert_eq!(ids(&channels), vec!["y"]);
    assert_eq!(h.transport.calls_to(&probe_url("y")).len(), 1);
}

#[tokio::test]
async fn test_budget_of_one_pauses_before_next_probe() {
    let h = harness(RateLimitConfig::default());
    h.transport
        .push(channels_url("g1"), ok_json(channel_list(&["a", "b", "c"]), Some(9)))
        .push(probe_url("a"), ok_json(one_message("a"), Some(1)))
        .push(probe_url("b"), ok_json(one_message("b"), Some(3)))
        .push(probe_url("c"), ok_json(one_message("c"), Some(2)));

    let channels = h.discovery.discover(&request(), true).await.unwrap();

    assert_eq!(ids(&channels), vec!["a", "b", "c"]);
    assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(5)]);

    let a = h.transport.calls_to(&probe_url("a"))[0].at;
    let b = h.transport.calls_to(&probe_url("b"))[0].at;
    let c = h.transport.calls_to(&probe_url("c"))[0].at;
    assert!(b - a >= Duration::from_secs(5));
    assert_eq!(c, b);
}

#[tokio::test]
async fn test_unreadable_or_ample_budget_does_not_pause() {
    let h = harness(RateLimitConfig::default());
    h.transport
        .push(channels_url("g1"), ok_json(channel_list(&["a", "b", "c"]), Some(9)))
        .push(probe_url("a"), status(404, "{}"))
        .push(probe_url("b"), ok_json(one_message("b"), Some(2)))
        .push(probe_url("c"), ok_json(one_message("c"), None));

    let channels = h.discovery.discover(&request(), true).await.unwrap();

    assert_eq!(ids(&channels), vec!["b"]);
    assert!(h.clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_no_pause_after_last_channel() {
    let h = harness(RateLimitConfig::default());
    h.transport
        .push(channels_url("g1"), ok_json(channel_list(&["a"]), Some(9)))
        .push(probe_url("a"), ok_json(one_message("a"), Some(1)));

    let channels = h.discovery.discover(&request(), true).await.unwrap();

    assert_eq!(ids(&channels), vec!["a"]);
    assert!(h.clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_zero_budget_excludes_channel_without_cooldown() {
    let h = harness(RateLimitConfig::default());
    h.transport
        .push(channels_url("g1"), ok_json(channel_list(&["a", "b"]), Some(9)))
        .push(probe_url("a"), ok_json(one_message("a"), Some(0)))
        .push(probe_url("b"), ok_json(one_message("b"), Some(4)));

    let channels = h.discovery.discover(&request(), true).await.unwrap();

    assert_eq!(ids(&channels), vec!["b"]);
    // The drained bucket is held by the limiter for its window, not by the
    // fixed cooldown
    assert!(!h.clock.sleeps().contains(&Duration::from_secs(5)));
}

#[tokio::test]
async fn test_probes_share_the_message_budget() {
    let rate_limit = RateLimitConfig::default().with_bucket(
        "getMessages",
        BucketConfig {
            max_requests: 2,
            window_secs: 10,
        },
    );
    let h = harness(rate_limit);
    h.transport
        .push(channels_url("g1"), ok_json(channel_list(&["a", "b", "c"]), Some(9)))
        .push(probe_url("a"), ok_json(one_message("a"), Some(40)))
        .push(probe_url("b"), ok_json(one_message("b"), Some(40)))
        .push(probe_url("c"), ok_json(one_message("c"), Some(40)));

    let channels = h.discovery.discover(&request(), true).await.unwrap();

    assert_eq!(ids(&channels), vec!["a", "b", "c"]);
    assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(10)]);
    assert_eq!(
        h.transport.calls_to(&probe_url("c"))[0].at,
        Duration::from_secs(10)
    );
}

#[tokio::test]
async fn test_list_server_error_propagates_after_retries() {
    let h = harness(RateLimitConfig::default());
    h.transport.push(channels_url("g1"), status(500, "internal error"));

    let err = h.discovery.discover(&request(), true).await.unwrap_err();

    match err.kind() {
        DiscordErrorKind::RetriesExhausted { attempts, last } => {
            assert_eq!(*attempts, 4);
            assert!(last.contains("HTTP 500"));
        }
        other => panic!("unexpected error kind: {other}"),
    }
    let context = err.context().as_ref().unwrap();
    assert_eq!(context.guild_id().as_deref(), Some("g1"));
    assert!(context.url().ends_with("/guilds/g1/channels"));
    assert!(err.to_string().contains("guild=g1"));

    // Only the list endpoint was called; backoff stayed under the cap
    assert_eq!(h.transport.calls_to(&channels_url("g1")).len(), 4);
    assert_eq!(h.transport.calls().len(), 4);
    let sleeps = h.clock.sleeps();
    assert_eq!(sleeps.len(), 3);
    assert!(sleeps.iter().all(|d| *d <= Duration::from_secs(10)));
}

#[tokio::test]
async fn test_list_transient_failure_recovers() {
    let h = harness(RateLimitConfig::default());
    h.transport
        .push(channels_url("g1"), network("connection reset"))
        .push(channels_url("g1"), status(503, ""))
        .push(channels_url("g1"), ok_json(channel_list(&["a"]), Some(9)));

    let channels = h.discovery.discover(&request(), false).await.unwrap();

    assert_eq!(ids(&channels), vec!["a"]);
    assert_eq!(h.clock.sleeps().len(), 2);
}

#[tokio::test]
async fn test_list_retry_budget_is_configurable() {
    let mut config = test_config();
    config.max_retries = 0;
    let h = harness_with(RateLimitConfig::default(), config);
    h.transport.push(channels_url("g1"), status(502, "bad gateway"));

    let err = h.discovery.discover(&request(), false).await.unwrap_err();

    assert!(matches!(
        err.kind(),
        DiscordErrorKind::RetriesExhausted { attempts: 1, .. }
    ));
    assert!(h.clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_list_rate_limit_retries_once_after_hint() {
    let h = harness(RateLimitConfig::default());
    h.transport
        .push(channels_url("g1"), rate_limited(1.5))
        .push(channels_url("g1"), ok_json(channel_list(&["a", "b"]), Some(9)));

    let channels = h.discovery.discover(&request(), false).await.unwrap();

    assert_eq!(ids(&channels), vec!["a", "b"]);
    assert_eq!(h.clock.sleeps(), vec![Duration::from_millis(1500)]);
    let calls = h.transport.calls_to(&channels_url("g1"));
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].at - calls[0].at, Duration::from_millis(1500));
}

#[tokio::test]
async fn test_list_rate_limit_twice_gives_up() {
    let h = harness(RateLimitConfig::default());
    h.transport.push(channels_url("g1"), rate_limited(1.0));

    let err = h.discovery.discover(&request(), true).await.unwrap_err();

    assert!(err.is_rate_limit());
    assert!(matches!(
        err.kind(),
        DiscordErrorKind::RateLimited {
            retry_after_ms: 1000,
            global: false
        }
    ));
    assert_eq!(h.transport.calls().len(), 2);
}

#[tokio::test]
async fn test_list_wait_past_max_wait_is_rate_limit_exceeded() {
    let rate_limit = RateLimitConfig::default()
        .with_bucket(
            "getChannels",
            BucketConfig {
                max_requests: 1,
                window_secs: 60,
            },
        )
        .with_max_wait(Duration::from_secs(5));
    let h = harness(rate_limit);
    h.transport
        .push(channels_url("g1"), ok_json(channel_list(&["a"]), Some(9)));

    h.discovery.discover(&request(), false).await.unwrap();
    let err = h.discovery.discover(&request(), false).await.unwrap_err();

    match err.kind() {
        DiscordErrorKind::RateLimitExceeded { operation, wait_ms } => {
            assert_eq!(operation, "getChannels");
            assert_eq!(*wait_ms, 60_000);
        }
        other => panic!("unexpected error kind: {other}"),
    }
    assert!(err.context().is_some());
    assert_eq!(h.transport.calls().len(), 1);
}

#[tokio::test]
async fn test_invalid_token_is_fatal_without_retry() {
    let h = harness(RateLimitConfig::default());
    h.transport
        .push(channels_url("g1"), status(401, r#"{"message":"401: Unauthorized","code":0}"#));

    let err = h.discovery.discover(&request(), true).await.unwrap_err();

    assert_eq!(*err.kind(), DiscordErrorKind::InvalidToken);
    assert_eq!(h.transport.calls().len(), 1);
}

#[tokio::test]
async fn test_list_access_failure_is_not_suppressed() {
    let h = harness(RateLimitConfig::default());
    h.transport
        .push(channels_url("g1"), status(403, r#"{"message":"Missing Access","code":50001}"#));

    let err = h.discovery.discover(&request(), true).await.unwrap_err();

    assert!(matches!(
        err.kind(),
        DiscordErrorKind::Http { status: 403, .. }
    ));
}

#[tokio::test]
async fn test_malformed_list_is_fatal() {
    let h = harness(RateLimitConfig::default());
    h.transport
        .push(channels_url("g1"), ok_json(json!({"channels": []}), Some(9)));

    let err = h.discovery.discover(&request(), false).await.unwrap_err();

    assert!(matches!(err.kind(), DiscordErrorKind::MalformedResponse(_)));
    assert_eq!(h.transport.calls().len(), 1);
}

#[tokio::test]
async fn test_repeated_discovery_is_idempotent() {
    let h = harness(RateLimitConfig::default());
    h.transport
        .push(channels_url("g1"), ok_json(channel_list(&["a", "b", "c"]), Some(9)))
        .push(probe_url("a"), ok_json(one_message("a"), Some(4)))
        .push(probe_url("b"), status(403, "{}"))
        .push(probe_url("c"), ok_json(one_message("c"), Some(4)));

    let first = h.discovery.discover(&request(), true).await.unwrap();
    let second = h.discovery.discover(&request(), true).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(ids(&first), vec!["a", "c"]);
}
