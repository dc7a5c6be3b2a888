//! Pod readiness inspection.

use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::Client;
use tracing::debug;

use crate::config::MonitorConfig;
use crate::error::HealerError;
use crate::k8s::bounded;

/// Source of unhealthy pod names for one poll.
#[async_trait]
pub trait PodInspector: Send + Sync {
    /// Names of the selected pods with at least one not-ready container,
    /// in API response order.
    async fn list_unhealthy_pods(&self) -> Result<Vec<String>, HealerError>;
}

/// A pod is unhealthy when any reported container is not ready.
///
/// Pods without container statuses (e.g. still scheduling) are not counted.
pub fn is_unhealthy(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .is_some_and(|statuses| statuses.iter().any(|c| !c.ready))
}

/// Names of the unhealthy pods, each listed once, preserving input order.
pub fn unhealthy_pod_names<'a>(pods: impl IntoIterator<Item = &'a Pod>) -> Vec<String> {
    pods.into_iter()
        .filter(|pod| is_unhealthy(pod))
        .map(|pod| pod.metadata.name.clone().unwrap_or_default())
        .collect()
}

/// Inspector backed by the Kubernetes API.
pub struct KubeInspector {
    pods: Api<Pod>,
    namespace: String,
    selector: String,
    timeout: Duration,
}

impl KubeInspector {
    #[must_use]
    pub fn new(client: Client, config: &MonitorConfig) -> Self {
        Self {
            pods: Api::namespaced(client, &config.namespace),
            namespace: config.namespace.clone(),
            selector: config.pod_selector.clone(),
            timeout: config.api_timeout,
        }
    }
}

#[async_trait]
impl PodInspector for KubeInspector {
    async fn list_unhealthy_pods(&self) -> Result<Vec<String>, HealerError> {
        let lp = ListParams::default().labels(&self.selector);

        let pod_list = bounded(self.timeout, self.pods.list(&lp))
            .await
            .map_err(|source| HealerError::InspectionFailed {
                namespace: self.namespace.clone(),
                source,
            })?;

        debug!(
            namespace = %self.namespace,
            selector = %self.selector,
            count = pod_list.items.len(),
            "Listed controller pods"
        );

        Ok(unhealthy_pod_names(&pod_list.items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pod(name: &str, ready: &[bool]) -> Pod {
        let statuses: Vec<_> = ready
            .iter()
            .enumerate()
            .map(|(i, ready)| {
                json!({
                    "name": format!("c{i}"),
                    "image": "registry.k8s.io/ingress-nginx/controller:v1.11.0",
                    "imageID": "",
                    "ready": ready,
                    "restartCount": 0
                })
            })
            .collect();

        serde_json::from_value(json!({
            "metadata": { "name": name },
            "status": { "phase": "Running", "containerStatuses": statuses }
        }))
        .unwrap()
    }

    fn pod_without_statuses(name: &str) -> Pod {
        serde_json::from_value(json!({
            "metadata": { "name": name },
            "status": { "phase": "Pending" }
        }))
        .unwrap()
    }

    #[test]
    fn test_ready_pod_is_healthy() {
        assert!(!is_unhealthy(&pod("ctrl-a", &[true, true])));
    }

    #[test]
    fn test_any_unready_container_is_unhealthy() {
        assert!(is_unhealthy(&pod("ctrl-a", &[true, false])));
    }

    #[test]
    fn test_missing_statuses_count_as_healthy() {
        assert!(!is_unhealthy(&pod_without_statuses("ctrl-a")));
        assert!(!is_unhealthy(&Pod::default()));
    }

    #[test]
    fn test_names_are_ordered_and_unique() {
        let pods = vec![
            pod("ctrl-c", &[false, false]),
            pod("ctrl-a", &[true]),
            pod_without_statuses("ctrl-b"),
            pod("ctrl-d", &[false]),
        ];

        assert_eq!(unhealthy_pod_names(&pods), vec!["ctrl-c", "ctrl-d"]);
    }

    #[test]
    fn test_empty_list_is_healthy() {
        assert!(unhealthy_pod_names(&Vec::<Pod>::new()).is_empty());
    }
}
