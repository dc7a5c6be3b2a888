//! Plain SMTP email channel.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::config::EmailSettings;
use crate::error::ChannelError;
use crate::events::NotifyEvent;
use crate::NotifyChannel;

/// Subject line of every alert email.
pub const EMAIL_SUBJECT: &str = "NGINX Health Alert";

/// Email channel delivering through an unauthenticated SMTP relay.
pub struct EmailChannel {
    settings: EmailSettings,
    timeout: Duration,
}

impl EmailChannel {
    #[must_use]
    pub const fn new(settings: EmailSettings, timeout: Duration) -> Self {
        Self { settings, timeout }
    }

    fn parse_mailbox(address: &str) -> Result<Mailbox, ChannelError> {
        address
            .parse()
            .map_err(|source| ChannelError::InvalidAddress {
                address: address.to_string(),
                source,
            })
    }

    fn build_message(from: &str, to: &str, event: &NotifyEvent) -> Result<Message, ChannelError> {
        let message = Message::builder()
            .from(Self::parse_mailbox(from)?)
            .to(Self::parse_mailbox(to)?)
            .subject(EMAIL_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(event.message())?;
        Ok(message)
    }
}

#[async_trait]
impl NotifyChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    fn enabled(&self) -> bool {
        self.settings.is_complete()
    }

    async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError> {
        let (Some(from), Some(to), Some(host)) = (
            self.settings.from.as_deref(),
            self.settings.to.as_deref(),
            self.settings.smtp_host.as_deref(),
        ) else {
            return Err(ChannelError::NotConfigured(
                "EMAIL_FROM, EMAIL_TO and SMTP_HOST".to_string(),
            ));
        };

        let message = Self::build_message(from, to, event)?;

        // Internal relays speak plain SMTP without auth.
        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                .port(self.settings.smtp_port)
                .timeout(Some(self.timeout))
                .build();

        debug!(channel = "email", relay = %host, to = %to, "Sending notification");

        mailer.send(message).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(port: u16) -> EmailSettings {
        EmailSettings {
            from: Some("monitor@example.com".to_string()),
            to: Some("oncall@example.com".to_string()),
            smtp_host: Some("127.0.0.1".to_string()),
            smtp_port: port,
        }
    }

    #[test]
    fn test_message_headers() {
        let event = NotifyEvent::remediation("ctrl", "ns", false);
        let message =
            EmailChannel::build_message("monitor@example.com", "oncall@example.com", &event)
                .unwrap();
        let raw = String::from_utf8(message.formatted())
            .unwrap()
            .replace("\r\n", "\n");
        let (headers, body) = raw.split_once("\n\n").unwrap();

        assert!(headers.contains("Subject: NGINX Health Alert"));
        assert!(headers.contains("From: monitor@example.com"));
        assert!(headers.contains("To: oncall@example.com"));
        assert!(headers.contains("Content-Type: text/plain"));

        // Long bodies go out quoted-printable with soft line breaks.
        let body = body.replace("=\n", "");
        assert_eq!(
            body.trim_end(),
            "Remediation triggered: [Self-Heal] Restarting deployment ctrl in namespace ns"
        );
    }

    #[tokio::test]
    async fn test_invalid_sender_is_reported() {
        let channel = EmailChannel::new(
            EmailSettings {
                from: Some("not an address".to_string()),
                ..settings(25)
            },
            Duration::from_secs(1),
        );

        let event = NotifyEvent::remediation("ctrl", "ns", false);
        let err = channel.send(&event).await.unwrap_err();
        assert!(matches!(err, ChannelError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_an_error() {
        // Grab a free port, then close it so the connection is refused.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let channel = EmailChannel::new(settings(port), Duration::from_secs(2));
        let event = NotifyEvent::remediation("ctrl", "ns", false);

        let err = channel.send(&event).await.unwrap_err();
        assert!(matches!(err, ChannelError::Smtp(_)));
    }

    #[test]
    fn test_disabled_without_recipient() {
        let channel = EmailChannel::new(
            EmailSettings {
                to: None,
                ..settings(25)
            },
            Duration::from_secs(1),
        );
        assert!(!channel.enabled());
    }
}
