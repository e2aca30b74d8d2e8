//! Builders for release metadata, archives and engine parts

use cooler_core::types::{ManagedComponent, NetworkConfig, RetryPolicy};
use cooler_update::{
    ArtifactDownloader, HostPlatform, InstallOrchestrator, ReleaseResolver, VersionReconciler,
    VisibilityPoller,
};
use serde_json::{json, Value};
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::MockServer;
use zip::write::FileOptions;
use zip::ZipWriter;

use super::constants::*;
use super::mock_server::release_path;

/// Builder for release endpoint JSON bodies
pub struct ReleaseBuilder {
    tag: Option<String>,
    assets: Vec<Value>,
}

impl ReleaseBuilder {
    pub fn new() -> Self {
        Self {
            tag: Some(TAG_V2_1_0.to_string()),
            assets: Vec::new(),
        }
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn without_tag(mut self) -> Self {
        self.tag = None;
        self
    }

    pub fn asset(mut self, name: &str, url: &str) -> Self {
        self.assets.push(json!({
            "name": name,
            "browser_download_url": url,
            "size": FAKE_ARCHIVE_CONTENT.len(),
        }));
        self
    }

    pub fn build(self) -> Value {
        let mut release = json!({
            "name": "Release",
            "prerelease": false,
            "published_at": "2026-01-15T10:00:00Z",
            "assets": self.assets,
        });
        if let Some(tag) = self.tag {
            release["tag_name"] = Value::String(tag);
        }
        release
    }
}

impl Default for ReleaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a zip archive from `(path, content)` entries
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        zip.start_file(*name, FileOptions::default())
            .expect("start zip entry");
        zip.write_all(content.as_bytes()).expect("write zip entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

/// Archive wrapping one addon in `folder`, as release channels ship them
pub fn addon_archive(folder: &str, id: &str, version: &str) -> Vec<u8> {
    let manifest = format!(r#"<addon id="{}" version="{}"/>"#, id, version);
    let manifest_path = format!("{}/addon.xml", folder);
    let settings_path = format!("{}/resources/settings.xml", folder);
    zip_bytes(&[
        (manifest_path.as_str(), manifest.as_str()),
        (settings_path.as_str(), "<settings/>"),
    ])
}

/// Component pointing at the mock release endpoint, with short poll timeouts
pub fn test_component(server: &MockServer, id: &str) -> ManagedComponent {
    let endpoint = Url::parse(&format!("{}{}", server.uri(), release_path(id)))
        .expect("valid mock endpoint");
    ManagedComponent::new(id, endpoint).with_timeouts(PRIMARY_TIMEOUT, FALLBACK_TIMEOUT)
}

/// Downloader without retries
pub fn test_downloader() -> ArtifactDownloader {
    ArtifactDownloader::new(&NetworkConfig::default(), RetryPolicy::no_retry())
        .expect("create downloader")
}

/// Reconciler wired to `host` with fast polling and no settle delay
pub fn test_reconciler(host: Arc<dyn HostPlatform>) -> VersionReconciler {
    let network = NetworkConfig::default();
    let orchestrator = InstallOrchestrator::new(
        host.clone(),
        VisibilityPoller::new(POLL_INTERVAL),
        Duration::ZERO,
    );
    VersionReconciler::new(
        host,
        ReleaseResolver::new(&network).expect("create resolver"),
        test_downloader(),
        orchestrator,
    )
}
