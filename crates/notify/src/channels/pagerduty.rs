//! PagerDuty Events v2 notification channel.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::ensure_success;
use crate::error::ChannelError;
use crate::events::NotifyEvent;
use crate::NotifyChannel;

/// PagerDuty Events API v2 enqueue endpoint.
pub const PAGERDUTY_EVENTS_URL: &str = "https://events.pagerduty.com/v2/enqueue";

/// `source` field reported on every incident.
pub const PAGERDUTY_SOURCE: &str = "nginx-ingress-monitor";

/// PagerDuty channel that opens a critical incident per event.
pub struct PagerDutyChannel {
    routing_key: Option<String>,
    endpoint: String,
    client: reqwest::Client,
}

impl PagerDutyChannel {
    /// Create a PagerDuty channel; `None` leaves it disabled.
    #[must_use]
    pub fn new(routing_key: Option<String>, client: reqwest::Client) -> Self {
        Self {
            routing_key,
            endpoint: PAGERDUTY_EVENTS_URL.to_string(),
            client,
        }
    }

    /// Send to a different Events API endpoint (proxies, tests).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn format_payload<'a>(routing_key: &'a str, event: &NotifyEvent) -> PagerDutyEvent<'a> {
        PagerDutyEvent {
            routing_key,
            event_action: "trigger",
            payload: PagerDutyPayload {
                summary: event.message(),
                severity: "critical",
                source: PAGERDUTY_SOURCE,
            },
        }
    }
}

#[async_trait]
impl NotifyChannel for PagerDutyChannel {
    fn name(&self) -> &'static str {
        "pagerduty"
    }

    fn enabled(&self) -> bool {
        self.routing_key.is_some()
    }

    async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError> {
        let routing_key = self
            .routing_key
            .as_deref()
            .ok_or_else(|| ChannelError::NotConfigured("PAGERDUTY_ROUTING_KEY".to_string()))?;

        let payload = Self::format_payload(routing_key, event);

        debug!(channel = "pagerduty", event_type = ?event.title(), "Sending notification");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?;
        ensure_success("PagerDuty", response).await
    }
}

// =============================================================================
// PagerDuty API types
// =============================================================================

#[derive(Debug, Serialize)]
struct PagerDutyEvent<'a> {
    routing_key: &'a str,
    event_action: &'static str,
    payload: PagerDutyPayload,
}

#[derive(Debug, Serialize)]
struct PagerDutyPayload {
    summary: String,
    severity: &'static str,
    source: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_critical_trigger() {
        let event = NotifyEvent::remediation("ctrl", "ns", true);

        let payload = PagerDutyChannel::format_payload("rk-123", &event);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "routing_key": "rk-123",
                "event_action": "trigger",
                "payload": {
                    "summary": "[Dry Run] Remediation triggered: [Self-Heal] \
                                Restarting deployment ctrl in namespace ns",
                    "severity": "critical",
                    "source": "nginx-ingress-monitor"
                }
            })
        );
    }

    #[test]
    fn test_default_endpoint() {
        let channel = PagerDutyChannel::new(Some("rk".to_string()), reqwest::Client::new());
        assert_eq!(channel.endpoint, PAGERDUTY_EVENTS_URL);
        assert!(channel.enabled());
    }
}
