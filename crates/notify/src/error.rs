//! Error types for the notification system.

use thiserror::Error;

/// Errors that can occur when delivering a notification to one channel.
///
/// These never escape [`crate::Notifier::notify`]; they are logged and
/// recorded in the [`crate::DeliveryReport`].
#[derive(Debug, Error)]
pub enum ChannelError {
    /// HTTP request failed (connect, timeout, body)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote endpoint answered with a non-success status
    #[error("{service} returned {status}: {body}")]
    Rejected {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// Channel is not configured
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    /// Sender or recipient could not be parsed as a mailbox
    #[error("Invalid email address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    /// Email message could not be assembled
    #[error("Failed to build email: {0}")]
    EmailBuild(#[from] lettre::error::Error),

    /// SMTP relay refused or dropped the message
    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
