//! Slack webhook notification channel.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::ensure_success;
use crate::error::ChannelError;
use crate::events::NotifyEvent;
use crate::NotifyChannel;

/// Slack incoming-webhook channel.
///
/// Posts `{"text": message}`, which any Slack-compatible webhook accepts.
pub struct SlackChannel {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl SlackChannel {
    /// Create a Slack channel; `None` leaves it disabled.
    #[must_use]
    pub fn new(webhook_url: Option<String>, client: reqwest::Client) -> Self {
        Self {
            webhook_url,
            client,
        }
    }
}

#[async_trait]
impl NotifyChannel for SlackChannel {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError> {
        let webhook_url = self
            .webhook_url
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured("SLACK_HOOK_URL".to_string()))?;

        let payload = SlackPayload {
            text: event.message(),
        };

        debug!(channel = "slack", event_type = ?event.title(), "Sending notification");

        let response = self.client.post(webhook_url).json(&payload).send().await?;
        ensure_success("Slack", response).await
    }
}

#[derive(Debug, Serialize)]
struct SlackPayload {
    text: String,
}
