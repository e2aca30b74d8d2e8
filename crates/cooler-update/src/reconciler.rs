//! Per-component reconciliation passes
//!
//! A pass brings one managed component in line with its latest upstream
//! release: resolve, compare with the installed version, download, install.
//! Every failure is folded into the returned [`ReconciliationOutcome`]; a
//! pass never aborts the process.

use anyhow::Context;
use cooler_core::types::{ManagedComponent, NotificationConfig, RuntimeConfig, VersionMatch};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::download::ArtifactDownloader;
use crate::host::HostPlatform;
use crate::orchestrator::{InstallOrchestrator, InstallTier};
use crate::poller::{VisibilityPoller, VisibilityTarget};
use crate::releases::{ReleaseResolver, ResolveError};
use crate::single_flight::ComponentLocks;
use crate::version::versions_match;

/// Why a pass ended the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeReason {
    /// Installed version already equals the latest tag
    UpToDate,

    /// A new release was installed and is visible
    Updated,

    /// No tag or no download location could be determined
    ResolveFailed,

    /// The artifact could not be fetched or verified
    DownloadFailed,

    /// Both install tiers finished without the component becoming visible
    InstallFailed,
}

impl fmt::Display for OutcomeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutcomeReason::UpToDate => "up to date",
            OutcomeReason::Updated => "updated",
            OutcomeReason::ResolveFailed => "resolve failed",
            OutcomeReason::DownloadFailed => "download failed",
            OutcomeReason::InstallFailed => "install failed",
        };
        write!(f, "{}", s)
    }
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationOutcome {
    pub component_id: String,

    /// The installed component changed during this pass
    pub changed: bool,

    pub reason: OutcomeReason,

    /// Latest tag, when resolution got that far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_tag: Option<String>,
}

impl ReconciliationOutcome {
    fn new(component: &ManagedComponent, reason: OutcomeReason, latest_tag: Option<String>) -> Self {
        Self {
            component_id: component.id().to_string(),
            changed: reason == OutcomeReason::Updated,
            reason,
            latest_tag,
        }
    }

    /// Whether the pass ended in a failure reason
    pub fn is_failure(&self) -> bool {
        matches!(
            self.reason,
            OutcomeReason::ResolveFailed | OutcomeReason::DownloadFailed | OutcomeReason::InstallFailed
        )
    }
}

/// Installed vs. latest version of a component, without side effects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionStatus {
    pub component_id: String,
    pub installed: Option<String>,
    pub latest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    pub up_to_date: bool,
}

/// Runs reconciliation passes for managed components
pub struct VersionReconciler {
    host: Arc<dyn HostPlatform>,
    resolver: ReleaseResolver,
    downloader: ArtifactDownloader,
    orchestrator: InstallOrchestrator,
    version_match: VersionMatch,
    notifications: NotificationConfig,
    locks: ComponentLocks,
}

impl VersionReconciler {
    /// Assemble a reconciler from its parts
    pub fn new(
        host: Arc<dyn HostPlatform>,
        resolver: ReleaseResolver,
        downloader: ArtifactDownloader,
        orchestrator: InstallOrchestrator,
    ) -> Self {
        Self {
            host,
            resolver,
            downloader,
            orchestrator,
            version_match: VersionMatch::default(),
            notifications: NotificationConfig::default(),
            locks: ComponentLocks::new(),
        }
    }

    /// Build a reconciler and all its collaborators from runtime configuration
    pub fn from_config(config: &RuntimeConfig, host: Arc<dyn HostPlatform>) -> anyhow::Result<Self> {
        let resolver =
            ReleaseResolver::new(&config.network).context("Failed to create release resolver")?;
        let downloader = ArtifactDownloader::new(&config.network, config.download_retry.clone())
            .context("Failed to create artifact downloader")?;
        let orchestrator = InstallOrchestrator::new(
            host.clone(),
            VisibilityPoller::from_config(&config.polling),
            config.polling.settle_delay(),
        );

        Ok(Self::new(host, resolver, downloader, orchestrator)
            .with_version_match(config.version_match)
            .with_notifications(config.notifications.clone()))
    }

    pub fn with_version_match(mut self, policy: VersionMatch) -> Self {
        self.version_match = policy;
        self
    }

    pub fn with_notifications(mut self, notifications: NotificationConfig) -> Self {
        self.notifications = notifications;
        self
    }

    /// Show download progress bars on the terminal
    pub fn with_download_progress(mut self, show: bool) -> Self {
        self.downloader = self.downloader.with_progress(show);
        self
    }

    /// Host this reconciler installs into
    pub fn host(&self) -> &Arc<dyn HostPlatform> {
        &self.host
    }

    /// Whether a pass for `component_id` is in flight
    pub fn is_busy(&self, component_id: &str) -> bool {
        self.locks.is_busy(component_id)
    }

    /// Local archive path for a component
    pub fn archive_path(&self, component: &ManagedComponent) -> PathBuf {
        self.host.scratch_root().join(format!("{}.zip", component.id()))
    }

    /// Run one pass for `component`.
    ///
    /// Concurrent calls for the same component are serialized; the later call
    /// resolves again once the first has finished.
    pub async fn reconcile(&self, component: &ManagedComponent) -> ReconciliationOutcome {
        let _guard = self.locks.acquire(component.id()).await;
        info!("Reconciling {}", component.id());

        let release = match self.resolver.resolve(component).await {
            Ok(release) => release,
            Err(e) => {
                warn!("Could not resolve latest {} release: {}", component.id(), e);
                return ReconciliationOutcome::new(component, OutcomeReason::ResolveFailed, None);
            }
        };

        let Some(download_url) = release.download_url.clone() else {
            return ReconciliationOutcome::new(
                component,
                OutcomeReason::ResolveFailed,
                Some(release.tag),
            );
        };

        let installed = self.host.installed_version(component.id()).await;
        debug!(
            "{}: installed {:?}, latest {}",
            component.id(),
            installed,
            release.tag
        );
        if installed
            .as_deref()
            .is_some_and(|v| versions_match(self.version_match, v, &release.tag))
        {
            info!("{} is up to date ({})", component.id(), release.tag);
            return ReconciliationOutcome::new(component, OutcomeReason::UpToDate, Some(release.tag));
        }

        info!(
            "Updating {} from {} to {}",
            component.id(),
            installed.as_deref().unwrap_or("nothing"),
            release.tag
        );
        self.notify(&format!(
            "Installing {} {}...",
            component.display_name(),
            release.tag
        ))
        .await;

        let archive = self.archive_path(component);
        let downloaded = match self
            .downloader
            .download_verified(&download_url, &archive, release.checksum_url.as_deref())
            .await
        {
            Ok(result) => result,
            Err(e) => {
                error!("Download of {} failed: {}", component.id(), e);
                self.notify(&format!("{} download failed", component.display_name()))
                    .await;
                return ReconciliationOutcome::new(
                    component,
                    OutcomeReason::DownloadFailed,
                    Some(release.tag),
                );
            }
        };

        let target = match installed {
            Some(_) => VisibilityTarget::Version {
                tag: &release.tag,
                policy: self.version_match,
            },
            None => VisibilityTarget::Present,
        };
        let attempt = self
            .orchestrator
            .install(component, &downloaded.file_path, target)
            .await;
        if attempt.is_success() {
            if attempt.tier == InstallTier::Fallback {
                info!("{} {} installed after fallback", component.id(), release.tag);
            }
            self.notify(&format!(
                "{} {} installed",
                component.display_name(),
                release.tag
            ))
            .await;
            ReconciliationOutcome::new(component, OutcomeReason::Updated, Some(release.tag))
        } else {
            self.notify(&format!(
                "{} {} could not be installed",
                component.display_name(),
                release.tag
            ))
            .await;
            ReconciliationOutcome::new(component, OutcomeReason::InstallFailed, Some(release.tag))
        }
    }

    /// Resolve and compare without downloading or installing
    pub async fn check(&self, component: &ManagedComponent) -> Result<VersionStatus, ResolveError> {
        let release = self.resolver.resolve(component).await?;
        let installed = self.host.installed_version(component.id()).await;
        let up_to_date = installed
            .as_deref()
            .is_some_and(|v| versions_match(self.version_match, v, &release.tag));

        Ok(VersionStatus {
            component_id: component.id().to_string(),
            installed,
            latest: release.tag,
            download_url: release.download_url,
            up_to_date,
        })
    }

    async fn notify(&self, message: &str) {
        if self.notifications.enabled {
            self.host.notify(message, self.notifications.duration()).await;
        }
    }
}
