//! Monitor configuration, resolved once from the environment at startup.

use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use notify::{EmailSettings, NotifyConfig};

use crate::error::HealerError;

/// Default namespace of the ingress controller.
pub const DEFAULT_NAMESPACE: &str = "ingress-nginx";

/// Default controller deployment name.
pub const DEFAULT_DEPLOYMENT: &str = "ingress-nginx-controller";

/// Label selector matching the ingress controller pods.
pub const DEFAULT_POD_SELECTOR: &str = "app.kubernetes.io/component=controller";

/// Default seconds between polls.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

/// Default consecutive unhealthy polls before a restart.
pub const DEFAULT_FAILURE_LIMIT: u32 = 3;

/// Default bound on each Kubernetes API call.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Default bound on each notification delivery.
pub const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;

/// Immutable monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Namespace holding the controller pods and deployment.
    pub namespace: String,
    /// Deployment restarted on remediation.
    pub deployment: String,
    /// Label selector for the pods to inspect.
    pub pod_selector: String,
    /// Time between polls.
    pub poll_interval: Duration,
    /// Consecutive unhealthy polls that trigger a restart.
    pub failure_threshold: NonZeroU32,
    /// Bound on each Kubernetes API call.
    pub api_timeout: Duration,
    /// Log remediation instead of patching the deployment.
    pub dry_run: bool,
    /// Notification channel settings.
    pub notify: NotifyConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            deployment: DEFAULT_DEPLOYMENT.to_string(),
            pod_selector: DEFAULT_POD_SELECTOR.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            failure_threshold: NonZeroU32::new(DEFAULT_FAILURE_LIMIT).unwrap_or(NonZeroU32::MIN),
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            dry_run: false,
            notify: NotifyConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Create configuration from environment variables.
    ///
    /// # Optional Environment Variables
    /// - `NGINX_NAMESPACE`: Namespace (default: ingress-nginx)
    /// - `NGINX_DEPLOYMENT`: Deployment (default: ingress-nginx-controller)
    /// - `NGINX_POD_SELECTOR`: Pod label selector (default: app.kubernetes.io/component=controller)
    /// - `CHECK_INTERVAL`: Poll interval in seconds (default: 60)
    /// - `FAILURE_LIMIT`: Consecutive failures before restart (default: 3)
    /// - `API_TIMEOUT_SECS`: Kubernetes call timeout (default: 30)
    /// - `SLACK_HOOK_URL`: Slack webhook (channel disabled if unset)
    /// - `PAGERDUTY_ROUTING_KEY`: PagerDuty routing key (channel disabled if unset)
    /// - `EMAIL_FROM`, `EMAIL_TO`: Email addresses (channel disabled unless both set)
    /// - `SMTP_HOST`: Mail relay (default: localhost)
    /// - `SMTP_PORT`: Mail relay port (default: 25)
    /// - `NOTIFY_TIMEOUT_SECS`: Delivery timeout (default: 10)
    /// - `NOTIFY_DISABLED`: Set to "true" to disable all notifications
    pub fn from_env(dry_run: bool) -> Result<Self, HealerError> {
        Self::from_lookup(|key| std::env::var(key).ok(), dry_run)
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F, dry_run: bool) -> Result<Self, HealerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let failure_limit: u32 = parse_var(&var, "FAILURE_LIMIT", DEFAULT_FAILURE_LIMIT)?;
        let failure_threshold =
            NonZeroU32::new(failure_limit).ok_or_else(|| HealerError::InvalidConfig {
                var: "FAILURE_LIMIT",
                value: failure_limit.to_string(),
                reason: "must be at least 1".to_string(),
            })?;

        let notify = NotifyConfig {
            slack_webhook_url: var("SLACK_HOOK_URL"),
            pagerduty_routing_key: var("PAGERDUTY_ROUTING_KEY"),
            email: EmailSettings {
                from: var("EMAIL_FROM"),
                to: var("EMAIL_TO"),
                smtp_host: var("SMTP_HOST").or_else(|| EmailSettings::default().smtp_host),
                smtp_port: parse_var(&var, "SMTP_PORT", notify::config::DEFAULT_SMTP_PORT)?,
            },
            timeout: positive_secs(&var, "NOTIFY_TIMEOUT_SECS", DEFAULT_NOTIFY_TIMEOUT_SECS)?,
            disabled: var("NOTIFY_DISABLED").is_some_and(|v| is_truthy(&v)),
        };

        Ok(Self {
            namespace: var("NGINX_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            deployment: var("NGINX_DEPLOYMENT").unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string()),
            pod_selector: var("NGINX_POD_SELECTOR")
                .unwrap_or_else(|| DEFAULT_POD_SELECTOR.to_string()),
            poll_interval: positive_secs(&var, "CHECK_INTERVAL", DEFAULT_CHECK_INTERVAL_SECS)?,
            failure_threshold,
            api_timeout: positive_secs(&var, "API_TIMEOUT_SECS", DEFAULT_API_TIMEOUT_SECS)?,
            dry_run,
            notify,
        })
    }
}

fn parse_var<T>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, HealerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| HealerError::InvalidConfig {
            var: key,
            reason: e.to_string(),
            value,
        }),
    }
}

fn positive_secs(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<Duration, HealerError> {
    let secs: u64 = parse_var(var, key, default)?;
    if secs == 0 {
        return Err(HealerError::InvalidConfig {
            var: key,
            value: secs.to_string(),
            reason: "must be at least 1 second".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn is_truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
