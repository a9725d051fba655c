use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::ChatMessage;
use crate::slack::ChatChannel;

/// Every failure alert starts with this, so the dedup gate can look past it.
pub const ALERT_PREFIX: &str = "⚠️ Changelog check has failed";

/// How far back to look for an announcement when the newest message is an alert.
pub const ALERT_LOOKBACK: u32 = 20;

fn is_alert(message: &ChatMessage) -> bool {
    message.text.starts_with(ALERT_PREFIX)
}

/// Checks the channel's latest announcement for an entry's identifier.
pub struct DedupGate {
    channel: Arc<dyn ChatChannel>,
}

impl DedupGate {
    pub fn new(channel: Arc<dyn ChatChannel>) -> Self {
        Self { channel }
    }

    /// True iff the most recent announcement in the channel contains `id`.
    ///
    /// Our own failure alerts are not announcements and are skipped. An empty
    /// channel or a failed read counts as "not posted", so a transient read
    /// failure can produce a duplicate rather than silence.
    pub async fn already_posted(&self, id: &str) -> bool {
        match self.latest_announcement().await {
            Ok(Some(message)) => message.text.contains(id),
            Ok(None) => false,
            Err(e) => {
                warn!("Error fetching last message from channel: {}", e);
                false
            }
        }
    }

    async fn latest_announcement(&self) -> Result<Option<ChatMessage>> {
        let latest = self.channel.recent_messages(1).await?.into_iter().next();
        match latest {
            Some(message) if is_alert(&message) => {
                debug!("Latest message is a failure alert, looking further back");
                let recent = self.channel.recent_messages(ALERT_LOOKBACK).await?;
                Ok(recent.into_iter().find(|m| !is_alert(m)))
            }
            other => Ok(other),
        }
    }
}

pub struct Notifier {
    channel: Arc<dyn ChatChannel>,
}

impl Notifier {
    pub fn new(channel: Arc<dyn ChatChannel>) -> Self {
        Self { channel }
    }

    /// Send `message` verbatim. Failures are logged, never returned.
    pub async fn post(&self, message: &str) {
        match self.channel.post_message(message).await {
            Ok(()) => info!("Message posted to channel"),
            Err(e) => warn!("Error sending message to channel: {}", e),
        }
    }

    /// Tell the channel that `failures` checks in a row have failed.
    pub async fn post_alert(&self, failures: u32) {
        let alert = format!(
            "{} {} times in a row. Notifications are paused until it recovers.",
            ALERT_PREFIX, failures
        );
        self.post(&alert).await;
    }
}
