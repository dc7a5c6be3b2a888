//! Channel configuration for the notifier.

use std::time::Duration;

/// Default SMTP relay host when `SMTP_HOST` is unset.
pub const DEFAULT_SMTP_HOST: &str = "localhost";

/// Default SMTP relay port (plain SMTP).
pub const DEFAULT_SMTP_PORT: u16 = 25;

/// Default per-delivery timeout.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for every notification channel.
///
/// A channel whose required settings are absent is skipped at send time.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Slack-compatible incoming webhook URL.
    pub slack_webhook_url: Option<String>,
    /// PagerDuty Events v2 routing key.
    pub pagerduty_routing_key: Option<String>,
    /// SMTP email settings.
    pub email: EmailSettings,
    /// Upper bound on a single HTTP or SMTP delivery.
    pub timeout: Duration,
    /// Disable every channel.
    pub disabled: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: None,
            pagerduty_routing_key: None,
            email: EmailSettings::default(),
            timeout: DEFAULT_DELIVERY_TIMEOUT,
            disabled: false,
        }
    }
}

/// SMTP email settings. Email is enabled only when sender, recipient and
/// relay host are all present.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub from: Option<String>,
    pub to: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            smtp_host: Some(DEFAULT_SMTP_HOST.to_string()),
            smtp_port: DEFAULT_SMTP_PORT,
        }
    }
}

impl EmailSettings {
    /// Whether sender, recipient and relay are all configured.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.from.is_some() && self.to.is_some() && self.smtp_host.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_incomplete_by_default() {
        let settings = EmailSettings::default();
        assert_eq!(settings.smtp_host.as_deref(), Some("localhost"));
        assert!(!settings.is_complete());
    }

    #[test]
    fn test_email_complete() {
        let settings = EmailSettings {
            from: Some("monitor@example.com".to_string()),
            to: Some("oncall@example.com".to_string()),
            ..EmailSettings::default()
        };
        assert!(settings.is_complete());

        let no_relay = EmailSettings {
            smtp_host: None,
            ..settings
        };
        assert!(!no_relay.is_complete());
    }
}
