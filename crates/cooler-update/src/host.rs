//! Host platform boundary
//!
//! The engine never talks to the media center directly. Everything it needs
//! from the host (install primitive, registry lookups, notifications) goes
//! through [`HostPlatform`], so the embedding environment decides how those
//! capabilities are provided.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Capabilities consumed from the host platform
#[async_trait]
pub trait HostPlatform: Send + Sync {
    /// Get the host name used in logs
    fn name(&self) -> &'static str;

    /// Request installation of a local archive.
    ///
    /// Fire-and-forget: `Ok` only means the request was handed to the host,
    /// not that the component is installed. Visibility polling is the only
    /// confirmation.
    async fn install_from_archive(&self, archive: &Path) -> Result<()>;

    /// Check whether a component is currently registered
    async fn is_component_present(&self, component_id: &str) -> bool;

    /// Force a rescan of locally installed components
    async fn refresh_local_registry(&self) -> Result<()>;

    /// Installed version of a component, if any
    async fn installed_version(&self, component_id: &str) -> Option<String>;

    /// Directory holding installed component folders
    fn component_root(&self) -> &Path;

    /// Scratch directory for downloaded archives and extraction
    fn scratch_root(&self) -> &Path;

    /// Show a user-facing notification
    async fn notify(&self, message: &str, duration: Duration);

    /// Execute a host built-in action (e.g. a skin setting change)
    async fn execute_builtin(&self, action: &str) -> Result<()>;
}
