//! CLI command implementations

pub mod check;
pub mod config;
pub mod reconcile;
pub mod run;
pub mod version;

use anyhow::{Context, Result};
use camino::Utf8Path;
use cooler_core::{HierarchicalConfigLoader, ManagedComponent, RuntimeConfig};
use cooler_update::{KodiHost, VersionReconciler};
use std::io::IsTerminal;
use std::sync::Arc;

/// Load the runtime configuration, from `path` when given
pub(crate) fn load_config(path: Option<&Utf8Path>) -> Result<RuntimeConfig> {
    let loader = HierarchicalConfigLoader::new().context("Failed to locate config directory")?;
    let config = match path {
        Some(path) => loader.load_runtime_config_from(path),
        None => loader.load_runtime_config(),
    };
    config.context("Failed to load runtime configuration")
}

/// Components named in `ids`, or all of them when `ids` is empty
pub(crate) fn select_components(
    config: &RuntimeConfig,
    ids: &[String],
) -> Result<Vec<ManagedComponent>> {
    if ids.is_empty() {
        return Ok(config.managed_components()?);
    }
    ids.iter()
        .map(|id| config.managed_component(id).map_err(Into::into))
        .collect()
}

/// Kodi host and reconciler built from configuration
pub(crate) fn build_reconciler(config: &RuntimeConfig) -> Result<Arc<VersionReconciler>> {
    let host = KodiHost::from_config(&config.host, &config.notifications)
        .context("Failed to set up Kodi host")?;
    let reconciler = VersionReconciler::from_config(config, Arc::new(host))?
        .with_download_progress(std::io::stderr().is_terminal());
    Ok(Arc::new(reconciler))
}
