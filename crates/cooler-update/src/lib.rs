//! Release reconciliation and self-healing install engine
//!
//! Provides:
//! - Release metadata resolution against GitHub-style release endpoints
//! - Artifact download with retry and optional checksum verification
//! - Two-tier installation (host install primitive, then manual extraction)
//! - Bounded visibility polling against the host registry
//! - Per-component single-flight reconciliation passes
//! - Startup and periodic background scheduling
//! - A Kodi host adapter

pub mod download;
pub mod host;
pub mod kodi;
pub mod normalize;
pub mod orchestrator;
pub mod poller;
pub mod reconciler;
pub mod releases;
pub mod scheduler;
pub mod single_flight;
pub mod version;

pub use download::{ArtifactDownloader, DownloadError, DownloadResult};
pub use host::HostPlatform;
pub use kodi::KodiHost;
pub use normalize::{MatchRule, NormalizationDecision};
pub use orchestrator::{InstallAttemptResult, InstallOrchestrator, InstallTier};
pub use poller::{VisibilityPoller, VisibilityTarget};
pub use reconciler::{OutcomeReason, ReconciliationOutcome, VersionReconciler, VersionStatus};
pub use releases::{Release, ReleaseAsset, ReleaseInfo, ReleaseResolver, ResolveError};
pub use scheduler::{ReconciliationScheduler, StartupReport};
pub use single_flight::ComponentLocks;

/// Current engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
