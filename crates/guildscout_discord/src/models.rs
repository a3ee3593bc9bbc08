//! Request and result types for channel discovery.

use derive_getters::Getters;
use guildscout_rate_limit::RateLimitHeaders;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A guild channel as returned by Discord.
///
/// Only the snowflake `id` is interpreted; every other field is carried
/// through untouched so the record handed back to the caller is the record
/// Discord sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscordChannel {
    id: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl DiscordChannel {
    /// Discord snowflake ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Channel name, if present.
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// Discord channel type code (0 = text, 2 = voice, 4 = category, ...).
    pub fn channel_type(&self) -> Option<u64> {
        self.fields.get("type").and_then(Value::as_u64)
    }

    /// Any other field of the record.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Input for listing a guild's channels.
#[derive(Clone, PartialEq, Eq, Getters)]
pub struct GetChannelsRequest {
    /// Guild snowflake ID.
    guild_id: String,
    /// Value sent in the `Authorization` header (e.g. `Bot <token>`).
    token: String,
}

impl GetChannelsRequest {
    /// Create a request for `guild_id` authorized by `token`.
    pub fn new(guild_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for GetChannelsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetChannelsRequest")
            .field("guild_id", &self.guild_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Input for fetching one page of a channel's messages.
///
/// A readability probe is a page of size one with no cursor.
///
/// # Example
///
/// ```
/// use guildscout_discord::MessagesRequestBuilder;
///
/// let request = MessagesRequestBuilder::default()
///     .channel_id("41771983423143937")
///     .token("Bot abc")
///     .build()
///     .unwrap();
/// assert_eq!(*request.page_size(), 1);
/// assert_eq!(*request.cursor(), None);
/// ```
#[derive(Clone, PartialEq, Eq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct MessagesRequest {
    /// Channel snowflake ID.
    channel_id: String,
    /// Value sent in the `Authorization` header.
    token: String,
    /// Messages per page.
    #[builder(default = "1")]
    page_size: u32,
    /// Fetch messages before this message ID.
    #[builder(default, setter(into, strip_option))]
    cursor: Option<String>,
}

impl MessagesRequest {
    /// Probe request: one message, no cursor.
    pub fn probe(channel_id: impl Into<String>, token: impl Into<String>, page_size: u32) -> Self {
        Self {
            channel_id: channel_id.into(),
            token: token.into(),
            page_size,
            cursor: None,
        }
    }
}

impl fmt::Debug for MessagesRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessagesRequest")
            .field("channel_id", &self.channel_id)
            .field("token", &"<redacted>")
            .field("page_size", &self.page_size)
            .field("cursor", &self.cursor)
            .finish()
    }
}

/// Remaining budget reported alongside a successful fetch.
///
/// Discord's `x-ratelimit-remaining` header doubles as the readability
/// signal: a fetch is only trusted when it came back with a usable count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BudgetHint {
    /// The response carried no usable remaining count.
    NoBudgetInfo,
    /// Remaining count at or below the pacing threshold.
    ExhaustedSoon(u32),
    /// Remaining count above the pacing threshold.
    Remaining(u32),
}

impl BudgetHint {
    /// Classify a remaining count against the pacing threshold.
    pub fn from_remaining(remaining: Option<u32>, threshold: u32) -> Self {
        match remaining {
            None => Self::NoBudgetInfo,
            Some(n) if n <= threshold => Self::ExhaustedSoon(n),
            Some(n) => Self::Remaining(n),
        }
    }

    /// The remaining count, if known.
    pub fn remaining(&self) -> Option<u32> {
        match self {
            Self::NoBudgetInfo => None,
            Self::ExhaustedSoon(n) | Self::Remaining(n) => Some(*n),
        }
    }

    /// A nonzero remaining count was observed.
    pub fn is_usable(&self) -> bool {
        self.remaining().is_some_and(|n| n > 0)
    }

    /// The budget is low but not zero; the caller should slow down.
    pub fn needs_cooldown(&self) -> bool {
        matches!(self, Self::ExhaustedSoon(n) if *n > 0)
    }
}

/// Outcome of probing one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// One message could be fetched.
    Readable {
        /// Budget observed on the probe call.
        budget: BudgetHint,
    },
    /// The probe failed for any reason.
    Unreadable,
}

impl ProbeResult {
    /// True for [`ProbeResult::Readable`].
    pub fn is_readable(&self) -> bool {
        matches!(self, Self::Readable { .. })
    }

    /// Budget observed by a readable probe.
    pub fn budget(&self) -> BudgetHint {
        match self {
            Self::Readable { budget } => *budget,
            Self::Unreadable => BudgetHint::NoBudgetInfo,
        }
    }
}

/// One page of messages.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct MessagePage {
    /// Raw message records, newest first.
    messages: Vec<Value>,
    /// Cursor for the next (older) page when this page was full.
    next_cursor: Option<String>,
    /// Budget observed on the call.
    budget: BudgetHint,
    /// Rate limit headers of the response.
    rate_limit: RateLimitHeaders,
}

impl MessagePage {
    pub(crate) fn new(
        messages: Vec<Value>,
        page_size: u32,
        budget: BudgetHint,
        rate_limit: RateLimitHeaders,
    ) -> Self {
        let full = usize::try_from(page_size).is_ok_and(|size| size > 0 && messages.len() >= size);
        let next_cursor = if full {
            messages
                .last()
                .and_then(|message| message.get("id"))
                .and_then(Value::as_str)
                .map(str::to_string)
        } else {
            None
        };
        Self {
            messages,
            next_cursor,
            budget,
            rate_limit,
        }
    }
}
