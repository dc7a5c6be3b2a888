//! Rolling-restart remediation for the controller deployment.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use notify::{Notifier, NotifyEvent};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::MonitorConfig;
use crate::error::HealerError;
use crate::k8s::bounded;

/// Pod-template annotation whose change forces a new rollout.
pub const RESTARTED_AT_ANNOTATION: &str = "restarted-at";

/// Merge patch that stamps the pod template with `restarted_at`.
pub fn restart_patch(restarted_at: DateTime<Utc>) -> Value {
    json!({
        "spec": {
            "template": {
                "metadata": {
                    "annotations": {
                        RESTARTED_AT_ANNOTATION: restarted_at.to_rfc3339_opts(SecondsFormat::Secs, true)
                    }
                }
            }
        }
    })
}

/// Write side of remediation: applies the restart patch to the deployment.
#[async_trait]
pub trait DeploymentRestarter: Send + Sync {
    async fn apply(&self, patch: &Value) -> Result<(), HealerError>;
}

/// Restarter backed by the Kubernetes API.
pub struct KubeRestarter {
    deployments: Api<Deployment>,
    deployment: String,
    namespace: String,
    timeout: Duration,
}

impl KubeRestarter {
    #[must_use]
    pub fn new(client: Client, config: &MonitorConfig) -> Self {
        Self {
            deployments: Api::namespaced(client, &config.namespace),
            deployment: config.deployment.clone(),
            namespace: config.namespace.clone(),
            timeout: config.api_timeout,
        }
    }
}

#[async_trait]
impl DeploymentRestarter for KubeRestarter {
    async fn apply(&self, patch: &Value) -> Result<(), HealerError> {
        bounded(
            self.timeout,
            self.deployments
                .patch(&self.deployment, &PatchParams::default(), &Patch::Merge(patch)),
        )
        .await
        .map(|_| ())
        .map_err(|source| HealerError::RemediationFailed {
            deployment: self.deployment.clone(),
            namespace: self.namespace.clone(),
            source,
        })
    }
}

/// Result of a remediation attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationOutcome {
    /// The restart patch was applied.
    Restarted,
    /// Dry run: the patch was built but not sent.
    Simulated,
}

/// Issues the restart and reports it.
pub struct Remediator {
    restarter: Box<dyn DeploymentRestarter>,
    notifier: Notifier,
    deployment: String,
    namespace: String,
    dry_run: bool,
}

impl Remediator {
    #[must_use]
    pub fn new(
        config: &MonitorConfig,
        restarter: Box<dyn DeploymentRestarter>,
        notifier: Notifier,
    ) -> Self {
        Self {
            restarter,
            notifier,
            deployment: config.deployment.clone(),
            namespace: config.namespace.clone(),
            dry_run: config.dry_run,
        }
    }

    /// Restart the deployment once. Never retries.
    ///
    /// A successful (or simulated) restart is announced on every channel. A
    /// failed patch is logged and returned without any notification.
    pub async fn restart(&self) -> Result<RemediationOutcome, HealerError> {
        info!(
            "[Self-Heal] Restarting deployment {} in namespace {}",
            self.deployment, self.namespace
        );

        let patch = restart_patch(Utc::now());

        let outcome = if self.dry_run {
            info!(patch = %patch, "[Dry Run] Skipping actual restart");
            RemediationOutcome::Simulated
        } else {
            if let Err(e) = self.restarter.apply(&patch).await {
                error!(error = %e, "Failed to restart");
                return Err(e);
            }
            RemediationOutcome::Restarted
        };

        let event = NotifyEvent::remediation(&self.deployment, &self.namespace, self.dry_run);
        let report = self.notifier.notify(&event).await;
        info!(
            delivered = report.delivered(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Remediation alert dispatched"
        );

        Ok(outcome)
    }
}
