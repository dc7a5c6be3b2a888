//! Notification event types for the ingress healer.

use chrono::{DateTime, Utc};

/// Events that can trigger notifications.
#[derive(Debug, Clone)]
pub enum NotifyEvent {
    /// A rolling restart of the controller deployment was issued
    /// (or simulated, when `dry_run` is set).
    RemediationTriggered {
        deployment: String,
        namespace: String,
        dry_run: bool,
        timestamp: DateTime<Utc>,
    },
}

impl NotifyEvent {
    /// Build a remediation event stamped with the current time.
    #[must_use]
    pub fn remediation(deployment: &str, namespace: &str, dry_run: bool) -> Self {
        Self::RemediationTriggered {
            deployment: deployment.to_string(),
            namespace: namespace.to_string(),
            dry_run,
            timestamp: Utc::now(),
        }
    }

    /// Get a short title for this event type.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::RemediationTriggered { deployment, .. } => {
                format!("Remediation Triggered: {deployment}")
            }
        }
    }

    /// The plain-text message every channel delivers.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::RemediationTriggered {
                deployment,
                namespace,
                dry_run,
                ..
            } => {
                let prefix = if *dry_run { "[Dry Run] " } else { "" };
                format!(
                    "{prefix}Remediation triggered: [Self-Heal] Restarting deployment \
                     {deployment} in namespace {namespace}"
                )
            }
        }
    }

    /// When the event was raised.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::RemediationTriggered { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remediation_message() {
        let event = NotifyEvent::remediation("ingress-nginx-controller", "ingress-nginx", false);
        assert_eq!(
            event.message(),
            "Remediation triggered: [Self-Heal] Restarting deployment \
             ingress-nginx-controller in namespace ingress-nginx"
        );
        assert_eq!(event.title(), "Remediation Triggered: ingress-nginx-controller");
    }

    #[test]
    fn test_dry_run_message_is_marked() {
        let event = NotifyEvent::remediation("ctrl", "ns", true);
        assert!(event.message().starts_with("[Dry Run] "));
    }

    #[test]
    fn test_remediation_is_stamped_now() {
        let before = Utc::now();
        let event = NotifyEvent::remediation("ctrl", "ns", false);
        assert!(event.timestamp() >= before);
        assert!(event.timestamp() <= Utc::now());
    }
}
