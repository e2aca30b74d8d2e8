//! Two-tier component installation
//!
//! Tier 1 hands the archive to the host's install primitive and waits for the
//! component to become visible. For an update, visible means registered at
//! the target version, since the old version is already present. The
//! primitive gives no completion signal, so when visibility does not follow,
//! tier 2 extracts the archive by hand:
//!
//! 1. Extract into a fresh scratch directory (never into the live root)
//! 2. Move each top-level entry into the component root, replacing
//!    same-named entries
//! 3. Normalize the component folder name (see [`crate::normalize`])
//! 4. Refresh the host registry and poll again
//!
//! The archive is deleted after success at either tier and kept on total
//! failure. The scratch directory is always removed.

use cooler_core::types::ManagedComponent;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::host::HostPlatform;
use crate::normalize::{normalize_component_dir, remove_path, NormalizationDecision};
use crate::poller::{VisibilityPoller, VisibilityTarget};

/// Install strategy tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallTier {
    /// Host archive-install primitive
    Primary,

    /// Manual extraction into the component root
    Fallback,
}

impl fmt::Display for InstallTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallTier::Primary => write!(f, "primary"),
            InstallTier::Fallback => write!(f, "fallback"),
        }
    }
}

/// Result of one install attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallAttemptResult {
    /// Last tier that ran
    pub tier: InstallTier,

    /// The tier's install action itself completed
    pub succeeded: bool,

    /// The component became visible before the tier's timeout
    pub visible_within_timeout: bool,
}

impl InstallAttemptResult {
    /// Terminal success: the component is visible
    pub fn is_success(&self) -> bool {
        self.visible_within_timeout
    }
}

/// Errors from the manual extraction tier
#[derive(Error, Debug)]
pub enum InstallError {
    /// Archive is missing or not a readable zip
    #[error("Failed to extract {}: {source}", archive.display())]
    Archive {
        archive: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Moving files into place failed
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] io::Error),

    /// Blocking extraction task did not complete
    #[error("Extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Drives the primary and fallback install tiers for one component
pub struct InstallOrchestrator {
    host: Arc<dyn HostPlatform>,
    poller: VisibilityPoller,
    settle_delay: Duration,
}

impl InstallOrchestrator {
    /// Create an orchestrator
    ///
    /// `settle_delay` is waited between the install request and the registry
    /// refresh that precedes polling.
    pub fn new(host: Arc<dyn HostPlatform>, poller: VisibilityPoller, settle_delay: Duration) -> Self {
        Self {
            host,
            poller,
            settle_delay,
        }
    }

    /// Install `archive` for `component`, falling back to manual extraction.
    ///
    /// Each tier succeeds only once the host reports the component as
    /// `target`.
    pub async fn install(
        &self,
        component: &ManagedComponent,
        archive: &Path,
        target: VisibilityTarget<'_>,
    ) -> InstallAttemptResult {
        let primary = self.try_primary(component, archive, target).await;
        if primary.is_success() {
            info!("{} installed via host install primitive", component.id());
            discard_archive(archive);
            return primary;
        }

        info!(
            "{} not visible after primary install, falling back to manual extraction",
            component.id()
        );
        let fallback = self.try_fallback(component, archive, target).await;
        if fallback.is_success() {
            info!("{} installed via manual extraction", component.id());
            discard_archive(archive);
        } else {
            error!(
                "Install of {} failed at both tiers, archive kept at {}",
                component.id(),
                archive.display()
            );
        }
        fallback
    }

    async fn try_primary(
        &self,
        component: &ManagedComponent,
        archive: &Path,
        target: VisibilityTarget<'_>,
    ) -> InstallAttemptResult {
        let requested = match self.host.install_from_archive(archive).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Install request for {} failed: {:#}", component.id(), e);
                false
            }
        };

        let visible = if requested {
            tokio::time::sleep(self.settle_delay).await;
            self.refresh_registry().await;
            self.poller
                .await_target(
                    self.host.as_ref(),
                    component.id(),
                    target,
                    component.primary_timeout(),
                )
                .await
        } else {
            false
        };

        InstallAttemptResult {
            tier: InstallTier::Primary,
            succeeded: requested,
            visible_within_timeout: visible,
        }
    }

    async fn try_fallback(
        &self,
        component: &ManagedComponent,
        archive: &Path,
        target: VisibilityTarget<'_>,
    ) -> InstallAttemptResult {
        let placed = match self.extract_and_place(component, archive).await {
            Ok(decision) => {
                debug!("Normalization for {}: {:?}", component.id(), decision);
                true
            }
            Err(e) => {
                error!("Manual extraction of {} failed: {}", component.id(), e);
                false
            }
        };

        let visible = if placed {
            self.refresh_registry().await;
            self.poller
                .await_target(
                    self.host.as_ref(),
                    component.id(),
                    target,
                    component.fallback_timeout(),
                )
                .await
        } else {
            false
        };

        InstallAttemptResult {
            tier: InstallTier::Fallback,
            succeeded: placed,
            visible_within_timeout: visible,
        }
    }

    /// Extract `archive` through a scratch directory into the component root
    pub async fn extract_and_place(
        &self,
        component: &ManagedComponent,
        archive: &Path,
    ) -> Result<NormalizationDecision, InstallError> {
        let archive = archive.to_path_buf();
        let scratch_root = self.host.scratch_root().to_path_buf();
        let component_root = self.host.component_root().to_path_buf();
        let component_id = component.id().to_string();

        tokio::task::spawn_blocking(move || {
            extract_and_place_blocking(&archive, &scratch_root, &component_root, &component_id)
        })
        .await?
    }

    async fn refresh_registry(&self) {
        if let Err(e) = self.host.refresh_local_registry().await {
            warn!("Registry refresh on {} failed: {:#}", self.host.name(), e);
        }
    }
}

fn extract_and_place_blocking(
    archive: &Path,
    scratch_root: &Path,
    component_root: &Path,
    component_id: &str,
) -> Result<NormalizationDecision, InstallError> {
    fs::create_dir_all(scratch_root)?;
    let scratch = tempfile::Builder::new()
        .prefix(&format!("extract-{}-", component_id))
        .tempdir_in(scratch_root)?;

    debug!("Extracting {} into {}", archive.display(), scratch.path().display());
    extract_archive(archive, scratch.path())?;

    fs::create_dir_all(component_root)?;
    let mut placed_dirs = Vec::new();
    for entry in fs::read_dir(scratch.path())? {
        let entry = entry?;
        let name = entry.file_name();
        let dst = component_root.join(&name);

        if dst.exists() {
            remove_path(&dst)?;
        }
        move_path(&entry.path(), &dst)?;
        debug!("Placed {}", dst.display());

        if dst.is_dir() {
            placed_dirs.push(name.to_string_lossy().into_owned());
        }
    }

    let decision = normalize_component_dir(component_root, component_id, &placed_dirs)?;
    scratch.close()?;
    Ok(decision)
}

/// Unpack a zip archive; an entry whose path escapes `dest` fails the whole
/// extraction with `InvalidArchive`
fn extract_archive(archive: &Path, dest: &Path) -> Result<(), InstallError> {
    let to_error = |source| InstallError::Archive {
        archive: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive).map_err(|e| to_error(e.into()))?;
    let mut zip = ZipArchive::new(file).map_err(to_error)?;
    zip.extract(dest).map_err(to_error)?;
    Ok(())
}

/// Rename, or copy and delete when the rename crosses filesystems
fn move_path(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!("Rename {} failed ({}), copying instead", src.display(), e);
            copy_recursive(src, dst)?;
            remove_path(src)
        }
    }
}

fn copy_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    if src.is_file() {
        fs::copy(src, dst)?;
        return Ok(());
    }

    for entry in WalkDir::new(src) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn discard_archive(archive: &Path) {
    if let Err(e) = fs::remove_file(archive) {
        warn!("Failed to delete {}: {}", archive.display(), e);
    }
}
