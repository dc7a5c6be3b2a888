//! Best-effort alert fan-out for the ingress healer.
//!
//! Every alert is delivered to Slack, email and PagerDuty in turn. A channel
//! without configuration is skipped with a warning; a channel that fails is
//! logged and recorded. Nothing propagates to the caller, so delivery can
//! never stop the monitor loop.
//!
//! # Usage
//!
//! ```no_run
//! use notify::{Notifier, NotifyConfig, NotifyEvent};
//!
//! # async fn run() {
//! let config = NotifyConfig {
//!     slack_webhook_url: Some("https://hooks.slack.com/services/T000/B000/XXX".to_string()),
//!     ..NotifyConfig::default()
//! };
//! let notifier = Notifier::from_config(&config);
//!
//! let report = notifier
//!     .notify(&NotifyEvent::remediation("ingress-nginx-controller", "ingress-nginx", false))
//!     .await;
//! assert!(report.delivered() <= 1);
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`NotifyChannel`] trait defines the interface for notification channels
//! - [`SlackChannel`], [`EmailChannel`] and [`PagerDutyChannel`] implement it
//! - [`Notifier`] dispatches events to all channels and returns a [`DeliveryReport`]

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod config;
pub mod error;
pub mod events;

pub use channels::email::EmailChannel;
pub use channels::pagerduty::PagerDutyChannel;
pub use channels::slack::SlackChannel;
pub use channels::NotifyChannel;
pub use config::{EmailSettings, NotifyConfig};
pub use error::ChannelError;
pub use events::NotifyEvent;

use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What happened to one event on one channel.
#[derive(Debug)]
pub enum ChannelOutcome {
    /// The remote side accepted the message.
    Delivered,
    /// The channel has no configuration and was not attempted.
    Skipped,
    /// Delivery was attempted and failed.
    Failed(ChannelError),
}

/// Per-channel outcomes of a single [`Notifier::notify`] call, in dispatch order.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub outcomes: Vec<(&'static str, ChannelOutcome)>,
}

impl DeliveryReport {
    /// Number of channels that accepted the message.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.count(|o| matches!(o, ChannelOutcome::Delivered))
    }

    /// Number of channels skipped for missing configuration.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ChannelOutcome::Skipped))
    }

    /// Number of channels whose delivery failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ChannelOutcome::Failed(_)))
    }

    /// Outcome for a named channel, if it was part of the fan-out.
    #[must_use]
    pub fn outcome(&self, channel: &str) -> Option<&ChannelOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| *name == channel)
            .map(|(_, outcome)| outcome)
    }

    fn count(&self, pred: impl Fn(&ChannelOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Central notification dispatcher.
///
/// Holds every known channel, configured or not, so that missing
/// configuration is reported on each alert rather than once at startup.
pub struct Notifier {
    channels: Vec<Arc<dyn NotifyChannel>>,
    disabled: bool,
}

impl Notifier {
    /// Build the Slack, email and PagerDuty channels from `config`.
    ///
    /// The HTTP channels share one client bounded by `config.timeout`.
    #[must_use]
    pub fn from_config(config: &NotifyConfig) -> Self {
        if config.disabled {
            info!("Notifications disabled via NOTIFY_DISABLED");
            return Self::disabled();
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client with timeout, using defaults");
                reqwest::Client::new()
            });

        let channels: Vec<Arc<dyn NotifyChannel>> = vec![
            Arc::new(SlackChannel::new(
                config.slack_webhook_url.clone(),
                client.clone(),
            )),
            Arc::new(EmailChannel::new(config.email.clone(), config.timeout)),
            Arc::new(PagerDutyChannel::new(
                config.pagerduty_routing_key.clone(),
                client,
            )),
        ];

        let enabled: Vec<&str> = channels
            .iter()
            .filter(|c| c.enabled())
            .map(|c| c.name())
            .collect();

        if enabled.is_empty() {
            warn!("No notification channels configured");
        } else {
            info!(channels = ?enabled, "Notification system initialized");
        }

        Self::with_channels(channels)
    }

    /// Create a notifier with specific channels.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a disabled notifier (for testing or when notifications are off).
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            channels: vec![],
            disabled: true,
        }
    }

    /// Deliver `event` to every channel, one after another.
    ///
    /// Never fails: unconfigured channels are skipped with a warning and
    /// delivery errors are logged. The returned report is informational.
    pub async fn notify(&self, event: &NotifyEvent) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        if self.disabled {
            debug!("Notifications disabled, skipping event");
            return report;
        }

        info!(raised_at = %event.timestamp(), "Alert: {}", event.message());

        for channel in &self.channels {
            let channel_name = channel.name();

            if !channel.enabled() {
                warn!(
                    channel = channel_name,
                    "Channel not configured, skipping notification"
                );
                report.outcomes.push((channel_name, ChannelOutcome::Skipped));
                continue;
            }

            let outcome = match channel.send(event).await {
                Ok(()) => {
                    debug!(channel = channel_name, "Notification sent");
                    ChannelOutcome::Delivered
                }
                Err(e) => {
                    error!(
                        channel = channel_name,
                        error = %e,
                        "Failed to send notification"
                    );
                    ChannelOutcome::Failed(e)
                }
            };
            report.outcomes.push((channel_name, outcome));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubChannel {
        name: &'static str,
        enabled: bool,
        fail: bool,
        sends: AtomicUsize,
    }

    impl StubChannel {
        fn new(name: &'static str, enabled: bool, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                enabled,
                fail,
                sends: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl NotifyChannel for StubChannel {
        fn name(&self) -> &'static str {
            self.name
        }

        fn enabled(&self) -> bool {
            self.enabled
        }

        async fn send(&self, _event: &NotifyEvent) -> Result<(), ChannelError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ChannelError::NotConfigured("stub".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn event() -> NotifyEvent {
        NotifyEvent::remediation("ingress-nginx-controller", "ingress-nginx", false)
    }

    #[test]
    fn test_from_config_registers_all_channels() {
        let notifier = Notifier::from_config(&NotifyConfig::default());
        let names: Vec<_> = notifier.channels.iter().map(|c| c.name()).collect();
        assert_eq!(names, ["slack", "email", "pagerduty"]);
        assert!(notifier.channels.iter().all(|c| !c.enabled()));

        let notifier = Notifier::from_config(&NotifyConfig {
            disabled: true,
            slack_webhook_url: Some("http://127.0.0.1:1/hook".to_string()),
            ..NotifyConfig::default()
        });
        assert!(notifier.disabled);
        assert!(notifier.channels.is_empty());
    }

    #[tokio::test]
    async fn test_skipped_channel_does_not_block_others() {
        let slack = StubChannel::new("slack", false, false);
        let pagerduty = StubChannel::new("pagerduty", true, false);
        let channels: Vec<Arc<dyn NotifyChannel>> = vec![slack.clone(), pagerduty.clone()];
        let notifier = Notifier::with_channels(channels);

        let report = notifier.notify(&event()).await;

        assert_eq!(slack.sends.load(Ordering::SeqCst), 0);
        assert_eq!(pagerduty.sends.load(Ordering::SeqCst), 1);
        assert!(matches!(report.outcome("slack"), Some(ChannelOutcome::Skipped)));
        assert!(matches!(
            report.outcome("pagerduty"),
            Some(ChannelOutcome::Delivered)
        ));
    }

    #[tokio::test]
    async fn test_failing_channel_does_not_block_others() {
        let slack = StubChannel::new("slack", true, true);
        let email = StubChannel::new("email", true, true);
        let pagerduty = StubChannel::new("pagerduty", true, false);
        let channels: Vec<Arc<dyn NotifyChannel>> =
            vec![slack.clone(), email.clone(), pagerduty.clone()];
        let notifier = Notifier::with_channels(channels);

        let report = notifier.notify(&event()).await;

        assert_eq!(report.failed(), 2);
        assert_eq!(report.delivered(), 1);
        assert_eq!(pagerduty.sends.load(Ordering::SeqCst), 1);
        let order: Vec<_> = report.outcomes.iter().map(|(name, _)| *name).collect();
        assert_eq!(order, ["slack", "email", "pagerduty"]);
    }

    #[tokio::test]
    async fn test_disabled_notifier_sends_nothing() {
        let report = Notifier::disabled().notify(&event()).await;
        assert!(report.outcomes.is_empty());
    }
}
