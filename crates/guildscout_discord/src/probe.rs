//! Readability triage for a single channel.

use crate::{CallPhase, MessageFetcher, MessagesRequest, ProbeResult};
use tracing::{debug, instrument};

/// Decides whether a channel can be read by fetching one message from it.
///
/// A probe never fails: every error, suppressed or not, is an
/// [`ProbeResult::Unreadable`] answer. A 429 seen here still defers the
/// shared limiter, so the next probe waits it out.
#[derive(Debug, Clone)]
pub struct MessageProbe {
    fetcher: MessageFetcher,
    page_size: u32,
}

impl MessageProbe {
    /// Create a probe fetching `page_size` messages per channel.
    pub fn new(fetcher: MessageFetcher, page_size: u32) -> Self {
        Self { fetcher, page_size }
    }

    /// Probe `channel_id` with `token`.
    #[instrument(skip(self, token))]
    pub async fn probe(&self, channel_id: &str, token: &str) -> ProbeResult {
        let request = MessagesRequest::probe(channel_id, token, self.page_size);
        match self.fetcher.fetch(&request, CallPhase::Probe).await {
            Ok(Some(page)) => {
                let budget = *page.budget();
                debug!(?budget, "Channel readable");
                ProbeResult::Readable { budget }
            }
            Ok(None) => {
                debug!("Channel not accessible");
                ProbeResult::Unreadable
            }
            Err(e) => {
                debug!(error = %e, "Probe failed, treating channel as unreadable");
                ProbeResult::Unreadable
            }
        }
    }
}
