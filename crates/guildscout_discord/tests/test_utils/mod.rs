//! Shared helpers for guildscout_discord integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use guildscout_discord::{
    ApiRequest, ApiResponse, ChannelDiscovery, DiscordConfig, Transport, TransportFailure,
};
use guildscout_rate_limit::{Clock, ManualClock, RateLimitConfig, RateLimiter};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// API base used by every scripted test.
pub const API_BASE: &str = "https://discord.test/api/v10";

/// Token used by every scripted test.
pub const TOKEN: &str = "Bot test-token";

pub type Reply = Result<ApiResponse, TransportFailure>;

/// A call seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub url: String,
    pub authorization: Option<String>,
    /// Virtual time of the call, since the transport was created.
    pub at: Duration,
}

/// Scripted transport replaying queued replies per URL.
///
/// The last reply queued for a URL is sticky: it is replayed for every
/// further call. Unscripted URLs fail as malformed.
#[derive(Debug)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<RecordedCall>>,
    clock: Arc<ManualClock>,
    origin: tokio::time::Instant,
}

impl MockTransport {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        let origin = clock.now();
        Self {
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            clock,
            origin,
        }
    }

    /// Queue `reply` for `url`.
    pub fn push(&self, url: impl Into<String>, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(url.into())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.url == url)
            .collect()
    }

    pub fn call_urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.url).collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: &ApiRequest) -> Result<ApiResponse, TransportFailure> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: request.url.clone(),
            authorization: request.authorization().map(str::to_string),
            at: self.clock.now() - self.origin,
        });

        let mut replies = self.replies.lock().unwrap();
        let Some(queue) = replies.get_mut(&request.url) else {
            return Err(TransportFailure::Malformed(format!(
                "no scripted reply for {}",
                request.url
            )));
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}

pub fn channels_url(guild_id: &str) -> String {
    format!("{}/guilds/{}/channels", API_BASE, guild_id)
}

pub fn probe_url(channel_id: &str) -> String {
    format!("{}/channels/{}/messages?limit=1", API_BASE, channel_id)
}

pub fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.insert(
            HeaderName::from_static(*name),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    map
}

/// 200 with `body` and an optional `x-ratelimit-remaining`.
pub fn ok_json(body: Value, remaining: Option<u32>) -> Reply {
    let remaining = remaining.map(|n| n.to_string());
    let pairs: Vec<(&'static str, &str)> = remaining
        .as_deref()
        .map(|n| vec![("x-ratelimit-remaining", n)])
        .unwrap_or_default();
    Ok(ApiResponse {
        status: 200,
        headers: headers(&pairs),
        body,
    })
}

pub fn status(code: u16, body: &str) -> Reply {
    Err(TransportFailure::Status {
        status: code,
        headers: HeaderMap::new(),
        body: body.to_string(),
    })
}

pub fn rate_limited(retry_after_secs: f64) -> Reply {
    Err(TransportFailure::Status {
        status: 429,
        headers: headers(&[("x-ratelimit-remaining", "0")]),
        body: json!({
            "message": "You are being rate limited.",
            "retry_after": retry_after_secs,
            "global": false
        })
        .to_string(),
    })
}

pub fn network(message: &str) -> Reply {
    Err(TransportFailure::Network(message.to_string()))
}

/// Channel records in list order.
pub fn channel_list(ids: &[&str]) -> Value {
    Value::Array(
        ids.iter()
            .enumerate()
            .map(|(position, id)| {
                json!({
                    "id": id,
                    "type": 0,
                    "name": format!("channel-{}", id),
                    "position": position
                })
            })
            .collect(),
    )
}

/// A one-message page.
pub fn one_message(channel_id: &str) -> Value {
    json!([{ "id": format!("m-{}", channel_id), "channel_id": channel_id, "content": "hi" }])
}

pub fn test_config() -> DiscordConfig {
    DiscordConfig::default().with_api_base(API_BASE)
}

/// Everything a scripted discovery test needs.
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub limiter: Arc<RateLimiter>,
    pub transport: Arc<MockTransport>,
    pub discovery: ChannelDiscovery,
}

pub fn harness(rate_limit: RateLimitConfig) -> Harness {
    harness_with(rate_limit, test_config())
}

pub fn harness_with(rate_limit: RateLimitConfig, config: DiscordConfig) -> Harness {
    let clock = Arc::new(ManualClock::new());
    let limiter = Arc::new(RateLimiter::with_clock(rate_limit, clock.clone()));
    let transport = Arc::new(MockTransport::new(clock.clone()));
    let discovery = ChannelDiscovery::new(transport.clone(), limiter.clone(), config);
    Harness {
        clock,
        limiter,
        transport,
        discovery,
    }
}
