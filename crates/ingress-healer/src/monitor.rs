//! The poll, count, remediate control loop.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::counter::{FailureCounter, HealthState};
use crate::error::HealerError;
use crate::inspector::PodInspector;
use crate::remediator::{RemediationOutcome, Remediator};

/// What one iteration observed and did.
#[derive(Debug)]
pub enum TickOutcome {
    /// Inspection failed; the counter was left unchanged.
    InspectionFailed,
    /// Every selected pod is ready; the counter was reset.
    Healthy,
    /// Unhealthy pods seen, threshold not yet reached.
    Degraded { count: u32, pods: Vec<String> },
    /// Threshold reached; a restart was attempted and the counter reset.
    Remediated(Result<RemediationOutcome, HealerError>),
}

/// Owns the failure counter and drives inspection and remediation.
pub struct Monitor {
    inspector: Box<dyn PodInspector>,
    remediator: Remediator,
    counter: FailureCounter,
    poll_interval: Duration,
    namespace: String,
    deployment: String,
    dry_run: bool,
}

impl Monitor {
    #[must_use]
    pub fn new(
        config: &MonitorConfig,
        inspector: Box<dyn PodInspector>,
        remediator: Remediator,
    ) -> Self {
        Self {
            inspector,
            remediator,
            counter: FailureCounter::new(config.failure_threshold),
            poll_interval: config.poll_interval,
            namespace: config.namespace.clone(),
            deployment: config.deployment.clone(),
            dry_run: config.dry_run,
        }
    }

    #[must_use]
    pub const fn counter(&self) -> &FailureCounter {
        &self.counter
    }

    #[must_use]
    pub const fn state(&self) -> HealthState {
        self.counter.state()
    }

    /// Run one poll and update the counter.
    pub async fn tick(&mut self) -> TickOutcome {
        let pods = match self.inspector.list_unhealthy_pods().await {
            Ok(pods) => pods,
            Err(e) => {
                error!(error = %e, failures = self.counter.count(), "Monitoring error");
                return TickOutcome::InspectionFailed;
            }
        };

        if pods.is_empty() {
            info!("All NGINX pods are healthy");
            self.counter.record_healthy();
            return TickOutcome::Healthy;
        }

        let threshold_reached = self.counter.record_unhealthy();
        let count = self.counter.count();
        warn!(
            pods = ?pods,
            failure = count,
            threshold = self.counter.threshold().get(),
            "Detected unhealthy pods: {:?} (failure #{})",
            pods,
            count
        );

        if !threshold_reached {
            return TickOutcome::Degraded { count, pods };
        }

        // Reset regardless of outcome so a failing restart is not retried every poll.
        let result = self.remediator.restart().await;
        self.counter.reset();
        TickOutcome::Remediated(result)
    }

    /// Poll until `shutdown` is cancelled.
    pub async fn run(&mut self, shutdown: &CancellationToken) {
        info!(
            namespace = %self.namespace,
            deployment = %self.deployment,
            interval_secs = self.poll_interval.as_secs(),
            threshold = self.counter.threshold().get(),
            dry_run = self.dry_run,
            "NGINX health monitor started"
        );

        loop {
            let outcome = tokio::select! {
                () = shutdown.cancelled() => break,
                outcome = self.tick() => outcome,
            };
            debug!(outcome = ?outcome, state = %self.counter.state(), "Poll complete");

            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!("Monitor stopped");
    }
}
