//! Notification channel implementations.

pub mod email;
pub mod pagerduty;
pub mod slack;

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::events::NotifyEvent;

/// Trait for notification channels (Slack, email, PagerDuty).
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Check if this channel is enabled/configured.
    fn enabled(&self) -> bool;

    /// Send a notification event to this channel.
    async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError>;
}

/// Map a non-2xx webhook response to [`ChannelError::Rejected`].
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<(), ChannelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(ChannelError::Rejected {
        service,
        status,
        body,
    })
}
