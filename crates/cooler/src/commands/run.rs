//! Service command
//!
//! Runs the startup pass, then keeps background components in sync until
//! Ctrl-C. The background loop finishes its current pass before exiting.

use anyhow::{Context, Result};
use camino::Utf8Path;
use cooler_update::ReconciliationScheduler;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

use super::{build_reconciler, load_config};
use crate::cli::RunArgs;
use crate::output;

/// How long the setup banner stays on screen
const SETUP_NOTIFICATION: Duration = Duration::from_secs(10);

pub async fn run(args: RunArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let reconciler = build_reconciler(&config)?;
    let scheduler = Arc::new(
        ReconciliationScheduler::from_config(&config, reconciler.clone())
            .context("Invalid component configuration")?,
    );

    if config.notifications.enabled {
        reconciler
            .host()
            .notify("Setting up your TV build...", SETUP_NOTIFICATION)
            .await;
    }

    let report = scheduler.run_startup().await;
    for outcome in &report.outcomes {
        output::outcome(outcome);
    }
    if report.restart_required() {
        output::warning("Components were updated, restart Kodi to apply them");
    }

    if args.once {
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let background = (!args.no_background).then(|| scheduler.clone().spawn_background(shutdown_rx));

    info!("Service running, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    info!("Shutting down");
    let _ = shutdown_tx.send(true);
    if let Some(handle) = background {
        handle.await.context("Background loop panicked")?;
    }

    Ok(())
}
