//! Release metadata resolution

use anyhow::Context;
use cooler_core::types::{ManagedComponent, NetworkConfig};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Suffix of checksum sidecar assets
const CHECKSUM_SUFFIX: &str = ".sha256";

/// Release information as returned by the release endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Release tag (e.g., "v2.1.0")
    #[serde(default)]
    pub tag_name: Option<String>,

    /// Release assets
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// Release asset
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    /// Asset name
    pub name: String,

    /// Download URL
    pub browser_download_url: String,
}

/// Where a resolved download location came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    /// A built asset attached to the release
    Asset,

    /// A source archive synthesized from the tag
    SourceArchive,
}

/// Outcome of a resolution: the latest tag and where to fetch it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Latest release tag
    pub tag: String,

    /// Direct download URL, absent when nothing matched
    pub download_url: Option<String>,

    /// Name of the selected asset, if an asset was selected
    pub asset_name: Option<String>,

    /// URL of a `.sha256` sidecar for the selected asset
    pub checksum_url: Option<String>,

    /// Source of `download_url`
    pub source: Option<ArtifactSource>,
}

/// Errors that can occur while resolving a release
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Request could not be sent or the body could not be read
    #[error("Release request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("Release endpoint returned status {status}")]
    Status { status: u16 },

    /// Body is not the expected JSON document
    #[error("Failed to parse release metadata: {0}")]
    Parse(#[from] serde_json::Error),

    /// Release carries no tag
    #[error("Release metadata has no tag")]
    NoTagFound,
}

/// Resolves the latest release of managed components
pub struct ReleaseResolver {
    /// HTTP client
    client: reqwest::Client,
}

impl ReleaseResolver {
    /// Create a new resolver
    pub fn new(network: &NetworkConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .timeout(network.http_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Fetch the latest release of a component and pick its artifact
    pub async fn resolve(&self, component: &ManagedComponent) -> Result<ReleaseInfo, ResolveError> {
        let release = self.get_latest(component).await?;
        let info = select_artifact(component, &release)?;

        match &info.download_url {
            Some(url) => info!(
                "Latest {} release: {} ({})",
                component.id(),
                info.tag,
                url
            ),
            None => warn!(
                "Release {} of {} has no artifact matching '{}'",
                info.tag,
                component.id(),
                component.asset_pattern()
            ),
        }

        Ok(info)
    }

    /// Get latest release metadata
    pub async fn get_latest(&self, component: &ManagedComponent) -> Result<Release, ResolveError> {
        let url = component.release_endpoint().as_str();
        debug!("Fetching latest release from: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ResolveError::Status {
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        let release: Release = serde_json::from_slice(&body)?;
        Ok(release)
    }
}

/// Choose the download location for a release.
///
/// The first asset passing the component's filter wins. Without one, a
/// configured source-archive template is filled in with the tag.
pub fn select_artifact(
    component: &ManagedComponent,
    release: &Release,
) -> Result<ReleaseInfo, ResolveError> {
    let tag = release
        .tag_name
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ResolveError::NoTagFound)?
        .to_string();

    if let Some(asset) = release
        .assets
        .iter()
        .find(|a| component.matches_asset(&a.name))
    {
        let sidecar = format!("{}{}", asset.name, CHECKSUM_SUFFIX);
        let checksum_url = release
            .assets
            .iter()
            .find(|a| a.name == sidecar)
            .map(|a| a.browser_download_url.clone());

        return Ok(ReleaseInfo {
            tag,
            download_url: Some(asset.browser_download_url.clone()),
            asset_name: Some(asset.name.clone()),
            checksum_url,
            source: Some(ArtifactSource::Asset),
        });
    }

    let archive_url = component.archive_url_for(&tag);
    let source = archive_url.as_ref().map(|_| ArtifactSource::SourceArchive);
    if archive_url.is_some() {
        debug!("No matching asset for {}, using source archive", tag);
    }

    Ok(ReleaseInfo {
        tag,
        download_url: archive_url,
        asset_name: None,
        checksum_url: None,
        source,
    })
}
