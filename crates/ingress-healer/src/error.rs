//! Error types for the ingress healer.

use std::time::Duration;
use thiserror::Error;

/// Failure of a single Kubernetes API call.
#[derive(Debug, Error)]
pub enum ApiCallError {
    /// The API server or transport returned an error
    #[error(transparent)]
    Kube(#[from] kube::Error),

    /// The call did not complete within the configured timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors raised by the monitor and its components.
///
/// Only `CredentialInitializationFailed` and `InvalidConfig` are fatal, and
/// only at startup. The others are logged by the loop, which keeps polling.
#[derive(Debug, Error)]
pub enum HealerError {
    /// Listing the controller pods failed; the poll is skipped
    #[error("Failed to inspect pods in namespace {namespace}: {source}")]
    InspectionFailed {
        namespace: String,
        #[source]
        source: ApiCallError,
    },

    /// Patching the deployment failed; no notification is sent
    #[error("Failed to restart deployment {deployment} in namespace {namespace}: {source}")]
    RemediationFailed {
        deployment: String,
        namespace: String,
        #[source]
        source: ApiCallError,
    },

    /// Neither kubeconfig nor in-cluster credentials could be loaded
    #[error("Failed to initialize cluster credentials: {0}")]
    CredentialInitializationFailed(String),

    /// An environment variable held an unusable value
    #[error("Invalid value {value:?} for {var}: {reason}")]
    InvalidConfig {
        var: &'static str,
        value: String,
        reason: String,
    },
}
