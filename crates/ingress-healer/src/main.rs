//! Ingress Healer CLI
//!
//! Watches ingress controller pod readiness and restarts the controller
//! deployment after repeated failures.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use ingress_healer::logging::{self, LogFormat, DEFAULT_LOG_FILE};
use ingress_healer::{k8s, KubeInspector, KubeRestarter, Monitor, MonitorConfig, Remediator};
use notify::Notifier;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Self-healing ingress monitor - restarts the controller after consecutive readiness failures
#[derive(Parser)]
#[command(name = "ingress-healer")]
#[command(about = "Self-healing ingress monitor - restarts the controller after consecutive readiness failures")]
#[command(version)]
struct Cli {
    /// Do not take real remediation actions
    #[arg(long)]
    dry_run: bool,

    /// Append-only log file
    #[arg(long, env = "LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Log line format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init(&cli.log_file, cli.log_format, cli.verbose)?;

    let config = logging::fatal(
        MonitorConfig::from_env(cli.dry_run),
        "Invalid monitor configuration",
    )?;
    if config.dry_run {
        info!("Dry run enabled: remediation will be logged but not applied");
    }

    let client = logging::fatal(
        k8s::connect().await,
        "Unable to establish Kubernetes credentials",
    )?;

    let notifier = Notifier::from_config(&config.notify);
    let inspector = KubeInspector::new(client.clone(), &config);
    let restarter = KubeRestarter::new(client, &config);
    let remediator = Remediator::new(&config, Box::new(restarter), notifier);
    let mut monitor = Monitor::new(&config, Box::new(inspector), remediator);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    monitor.run(&shutdown).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
