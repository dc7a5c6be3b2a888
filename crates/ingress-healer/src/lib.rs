//! Self-healing monitor for an ingress controller.
//!
//! Polls controller pod readiness, counts consecutive unhealthy polls, and
//! once the configured threshold is reached patches the controller
//! deployment's pod template to force a rolling restart. Restarts are
//! announced through the [`notify`] crate.
//!
//! - [`inspector`]: lists pods and classifies readiness
//! - [`remediator`]: builds and applies the restart patch
//! - [`counter`]: the consecutive-failure state machine
//! - [`monitor`]: the poll loop tying them together

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod counter;
pub mod error;
pub mod inspector;
pub mod k8s;
pub mod logging;
pub mod monitor;
pub mod remediator;

pub use config::MonitorConfig;
pub use counter::{FailureCounter, HealthState};
pub use error::{ApiCallError, HealerError};
pub use inspector::{KubeInspector, PodInspector};
pub use monitor::{Monitor, TickOutcome};
pub use remediator::{DeploymentRestarter, KubeRestarter, RemediationOutcome, Remediator};
