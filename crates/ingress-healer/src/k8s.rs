//! Kubernetes client setup and bounded API calls.

use std::future::Future;
use std::time::Duration;

use kube::config::{Config, KubeConfigOptions};
use kube::Client;
use tracing::{debug, info};

use crate::error::{ApiCallError, HealerError};

/// Build a client from the local kubeconfig, falling back to the in-cluster
/// service account.
pub async fn connect() -> Result<Client, HealerError> {
    let config = match Config::from_kubeconfig(&KubeConfigOptions::default()).await {
        Ok(config) => {
            info!("Loaded cluster credentials from kubeconfig");
            config
        }
        Err(kubeconfig_err) => {
            debug!(error = %kubeconfig_err, "kubeconfig unavailable, trying in-cluster credentials");
            let config = Config::incluster().map_err(|in_cluster_err| {
                HealerError::CredentialInitializationFailed(format!(
                    "kubeconfig: {kubeconfig_err}; in-cluster: {in_cluster_err}"
                ))
            })?;
            info!("Loaded in-cluster service account credentials");
            config
        }
    };

    Client::try_from(config)
        .map_err(|e| HealerError::CredentialInitializationFailed(e.to_string()))
}

/// Await a kube call, giving up after `timeout`.
pub async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, ApiCallError>
where
    F: Future<Output = Result<T, kube::Error>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(ApiCallError::from),
        Err(_) => Err(ApiCallError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let result: Result<(), ApiCallError> = bounded(Duration::from_secs(5), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(ApiCallError::Timeout(d)) if d == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let result = bounded(Duration::from_secs(5), async { Ok::<_, kube::Error>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
