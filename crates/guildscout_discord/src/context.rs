//! Request context attached to every classified failure.

use reqwest::Method;
use std::fmt;

/// Remote operations, named after the rate limit bucket they draw from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::EnumString,
)]
pub enum Operation {
    /// `GET /guilds/{guild_id}/channels`
    #[strum(serialize = "getChannels")]
    GetChannels,
    /// `GET /channels/{channel_id}/messages`
    #[strum(serialize = "getMessages")]
    GetMessages,
}

/// Which part of a discovery run issued the call.
///
/// The phase decides whether an access failure is an error (`List`) or an
/// expected negative answer (`Probe`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum CallPhase {
    /// Listing the guild's channels.
    List,
    /// Probing a single channel for readability.
    Probe,
}

/// Everything needed to diagnose a failed call.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct RequestContext {
    /// Operation (and bucket) of the call.
    operation: Operation,
    /// Phase the call was made in.
    phase: CallPhase,
    /// HTTP method.
    method: Method,
    /// Full request URL.
    url: String,
    /// Guild the call concerns, if any.
    guild_id: Option<String>,
    /// Channel the call concerns, if any.
    channel_id: Option<String>,
}

impl RequestContext {
    /// Context for listing a guild's channels.
    pub fn list_channels(url: impl Into<String>, guild_id: impl Into<String>) -> Self {
        Self {
            operation: Operation::GetChannels,
            phase: CallPhase::List,
            method: Method::GET,
            url: url.into(),
            guild_id: Some(guild_id.into()),
            channel_id: None,
        }
    }

    /// Context for fetching a page of a channel's messages.
    pub fn get_messages(
        url: impl Into<String>,
        channel_id: impl Into<String>,
        phase: CallPhase,
    ) -> Self {
        Self {
            operation: Operation::GetMessages,
            phase,
            method: Method::GET,
            url: url.into(),
            guild_id: None,
            channel_id: Some(channel_id.into()),
        }
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (operation={}, phase={}",
            self.method, self.url, self.operation, self.phase
        )?;
        if let Some(guild_id) = &self.guild_id {
            write!(f, ", guild={}", guild_id)?;
        }
        if let Some(channel_id) = &self.channel_id {
            write!(f, ", channel={}", channel_id)?;
        }
        write!(f, ")")
    }
}
