//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. Runtime config (~/.cooler/cooler-runtime.yaml, or an explicit file)
//! 3. Environment variables (COOLER_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::RuntimeConfig;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use tracing::debug;

/// File name of the user runtime configuration
pub const RUNTIME_CONFIG_FILE: &str = "cooler-runtime.yaml";

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a new hierarchical config loader
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the standard config directory (~/.cooler)
    fn get_config_dir() -> Result<Utf8PathBuf> {
        let home = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| Error::invalid_config("Could not determine home directory"))?;

        Ok(Utf8PathBuf::from(home).join(".cooler"))
    }

    /// Path of the user runtime config file
    pub fn runtime_config_path(&self) -> Utf8PathBuf {
        self.config_dir.join(RUNTIME_CONFIG_FILE)
    }

    /// Load runtime configuration with hierarchical precedence
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        let path = self.runtime_config_path();
        if path.exists() {
            self.load_layers(Some(&path))
        } else {
            self.load_layers(None)
        }
    }

    /// Load runtime configuration using an explicit file instead of the
    /// standard location. The file must exist.
    pub fn load_runtime_config_from(&self, path: &Utf8Path) -> Result<RuntimeConfig> {
        if !path.exists() {
            return Err(Error::config_not_found(path.as_str()));
        }
        self.load_layers(Some(path))
    }

    fn load_layers(&self, file: Option<&Utf8Path>) -> Result<RuntimeConfig> {
        // Start with embedded defaults
        let mut config = Self::load_embedded_config::<RuntimeConfig>("runtime-defaults.yaml")?;

        if let Some(path) = file {
            debug!("Loading runtime config from {}", path);
            let file_config = self.load_yaml_file::<RuntimeConfig>(path)?;
            config = Self::merge_runtime_config(config, file_config);
        }

        // Apply environment variable overrides
        config = self.apply_env_overrides(config)?;

        // Surface component errors at load time rather than on first pass
        config.managed_components()?;

        Ok(config)
    }

    /// Load an embedded configuration file
    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        let config: T = serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })?;

        Ok(config)
    }

    /// Load a YAML file and parse it
    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let config: T = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        Ok(config)
    }

    /// Merge two runtime configs (base is overridden by overlay)
    fn merge_runtime_config(base: RuntimeConfig, overlay: RuntimeConfig) -> RuntimeConfig {
        RuntimeConfig {
            network: overlay.network,
            download_retry: overlay.download_retry,
            polling: overlay.polling,
            schedule: overlay.schedule,
            host: overlay.host,
            notifications: overlay.notifications,
            version_match: overlay.version_match,
            // An overlay without components keeps the built-in set
            components: if overlay.components.is_empty() {
                base.components
            } else {
                overlay.components
            },
        }
    }

    /// Apply environment variable overrides to runtime config
    fn apply_env_overrides(&self, mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Ok(val) = env::var("COOLER_HTTP_TIMEOUT_SECS") {
            config.network.http_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("COOLER_HTTP_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("COOLER_DOWNLOAD_TIMEOUT_SECS") {
            config.network.download_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("COOLER_DOWNLOAD_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("COOLER_POLL_INTERVAL_MS") {
            config.polling.interval_ms = val.parse().map_err(|_| {
                Error::invalid_config("COOLER_POLL_INTERVAL_MS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("COOLER_SCHEDULE_INTERVAL_SECS") {
            config.schedule.interval_secs = val.parse().map_err(|_| {
                Error::invalid_config("COOLER_SCHEDULE_INTERVAL_SECS must be a valid number")
            })?;
        }

        // Host paths
        if let Ok(val) = env::var("COOLER_ADDONS_DIR") {
            config.host.addons_dir = Some(Utf8PathBuf::from(val));
        }

        if let Ok(val) = env::var("COOLER_TEMP_DIR") {
            config.host.temp_dir = Some(Utf8PathBuf::from(val));
        }

        if let Ok(val) = env::var("COOLER_JSONRPC_URL") {
            config.host.jsonrpc_url = Some(val);
        }

        if let Ok(val) = env::var("COOLER_VERSION_MATCH") {
            config.version_match = val.parse().map_err(Error::invalid_config)?;
        }

        if config.polling.interval_ms == 0 {
            return Err(Error::invalid_config("polling interval must be greater than zero"));
        }
        if config.schedule.interval_secs == 0 {
            return Err(Error::invalid_config("schedule interval must be greater than zero"));
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}
