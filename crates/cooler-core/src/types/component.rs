//! Managed component definitions
//!
//! A [`ManagedComponent`] is the validated, immutable form of a
//! [`ComponentConfig`] entry. One instance exists per tracked component for
//! the lifetime of the process.

use globset::{Glob, GlobMatcher};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use super::runtime_config::{ComponentConfig, PollingConfig, RuntimeConfig};
use crate::error::{Error, Result};

/// Placeholder substituted with the release tag in archive URL templates
pub const TAG_PLACEHOLDER: &str = "{tag}";

/// A component kept in sync with its upstream releases
#[derive(Debug, Clone)]
pub struct ManagedComponent {
    id: String,
    display_name: String,
    release_endpoint: Url,
    asset_pattern: String,
    asset_filter: GlobMatcher,
    archive_url_template: Option<String>,
    background: bool,
    primary_timeout: Duration,
    fallback_timeout: Duration,
    on_ready: Vec<String>,
}

impl ManagedComponent {
    /// Create a component with default asset filter (`*.zip`) and timeouts
    pub fn new(id: impl Into<String>, release_endpoint: Url) -> Self {
        let id = id.into();
        let polling = PollingConfig::default();
        Self {
            display_name: id.clone(),
            id,
            release_endpoint,
            asset_pattern: "*.zip".to_string(),
            asset_filter: zip_matcher(),
            archive_url_template: None,
            background: false,
            primary_timeout: Duration::from_secs(polling.primary_timeout_secs),
            fallback_timeout: Duration::from_secs(polling.fallback_timeout_secs),
            on_ready: Vec::new(),
        }
    }

    /// Build a component from its configuration entry
    pub fn from_config(config: &ComponentConfig, polling: &PollingConfig) -> Result<Self> {
        let id = config.id.trim();
        if id.is_empty() {
            return Err(Error::invalid_config("component id must not be empty"));
        }
        if id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(Error::invalid_component(id, "id must be a plain directory name"));
        }

        let release_endpoint = Url::parse(&config.release_endpoint).map_err(|e| {
            Error::invalid_component(id, format!("invalid release endpoint: {}", e))
        })?;

        let asset_filter = Glob::new(&config.asset_pattern)
            .map_err(|e| Error::invalid_component(id, format!("invalid asset pattern: {}", e)))?
            .compile_matcher();

        if let Some(template) = &config.archive_url_template {
            if !template.contains(TAG_PLACEHOLDER) {
                return Err(Error::invalid_component(
                    id,
                    format!("archive URL template must contain {}", TAG_PLACEHOLDER),
                ));
            }
        }

        Ok(Self {
            id: id.to_string(),
            display_name: config.name.clone().unwrap_or_else(|| id.to_string()),
            release_endpoint,
            asset_pattern: config.asset_pattern.clone(),
            asset_filter,
            archive_url_template: config.archive_url_template.clone(),
            background: config.background,
            primary_timeout: Duration::from_secs(
                config
                    .primary_timeout_secs
                    .unwrap_or(polling.primary_timeout_secs),
            ),
            fallback_timeout: Duration::from_secs(
                config
                    .fallback_timeout_secs
                    .unwrap_or(polling.fallback_timeout_secs),
            ),
            on_ready: config.on_ready.clone(),
        })
    }

    /// Set a display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Replace the asset filter glob
    pub fn with_asset_pattern(mut self, pattern: &str) -> Result<Self> {
        self.asset_filter = Glob::new(pattern)
            .map_err(|e| Error::invalid_component(&self.id, e.to_string()))?
            .compile_matcher();
        self.asset_pattern = pattern.to_string();
        Ok(self)
    }

    /// Set the source archive URL template
    pub fn with_archive_template(mut self, template: impl Into<String>) -> Self {
        self.archive_url_template = Some(template.into());
        self
    }

    /// Set both visibility timeouts
    pub fn with_timeouts(mut self, primary: Duration, fallback: Duration) -> Self {
        self.primary_timeout = primary;
        self.fallback_timeout = fallback;
        self
    }

    /// Include in the background schedule
    pub fn with_background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    /// Set the actions run once the component is visible after startup
    pub fn with_on_ready(mut self, actions: Vec<String>) -> Self {
        self.on_ready = actions;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn release_endpoint(&self) -> &Url {
        &self.release_endpoint
    }

    pub fn asset_pattern(&self) -> &str {
        &self.asset_pattern
    }

    pub fn archive_url_template(&self) -> Option<&str> {
        self.archive_url_template.as_deref()
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn primary_timeout(&self) -> Duration {
        self.primary_timeout
    }

    pub fn fallback_timeout(&self) -> Duration {
        self.fallback_timeout
    }

    pub fn on_ready(&self) -> &[String] {
        &self.on_ready
    }

    /// Check whether a release asset file name passes the filter
    pub fn matches_asset(&self, file_name: &str) -> bool {
        self.asset_filter.is_match(file_name)
    }

    /// Source archive URL for a tag, if a template is configured
    pub fn archive_url_for(&self, tag: &str) -> Option<String> {
        self.archive_url_template
            .as_ref()
            .map(|template| template.replace(TAG_PLACEHOLDER, tag))
    }
}

fn zip_matcher() -> GlobMatcher {
    Glob::new("*.zip")
        .expect("Invalid static glob pattern")
        .compile_matcher()
}

impl RuntimeConfig {
    /// Validate and build every configured component
    pub fn managed_components(&self) -> Result<Vec<ManagedComponent>> {
        let mut seen = HashSet::new();
        let mut components = Vec::with_capacity(self.components.len());

        for entry in &self.components {
            let component = ManagedComponent::from_config(entry, &self.polling)?;
            if !seen.insert(component.id().to_string()) {
                return Err(Error::duplicate_component(component.id()));
            }
            components.push(component);
        }

        Ok(components)
    }

    /// Build a single configured component by id
    pub fn managed_component(&self, id: &str) -> Result<ManagedComponent> {
        self.managed_components()?
            .into_iter()
            .find(|c| c.id() == id)
            .ok_or_else(|| Error::unknown_component(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(id: &str) -> ComponentConfig {
        ComponentConfig {
            id: id.to_string(),
            name: None,
            release_endpoint: "https://api.github.com/repos/owner/repo/releases/latest".to_string(),
            asset_pattern: "*.zip".to_string(),
            archive_url_template: None,
            background: false,
            primary_timeout_secs: None,
            fallback_timeout_secs: None,
            on_ready: Vec::new(),
        }
    }

    #[test]
    fn test_from_config_applies_polling_defaults() {
        let polling = PollingConfig {
            primary_timeout_secs: 25,
            fallback_timeout_secs: 15,
            ..PollingConfig::default()
        };
        let mut entry = config("skin.auramod");
        entry.primary_timeout_secs = Some(30);

        let component = ManagedComponent::from_config(&entry, &polling).unwrap();
        assert_eq!(component.primary_timeout(), Duration::from_secs(30));
        assert_eq!(component.fallback_timeout(), Duration::from_secs(15));
        assert_eq!(component.display_name(), "skin.auramod");
    }

    #[test]
    fn test_asset_filter() {
        let component =
            ManagedComponent::from_config(&config("skin.auramod"), &PollingConfig::default())
                .unwrap();
        assert!(component.matches_asset("skin.auramod-2.1.0.zip"));
        assert!(!component.matches_asset("skin.auramod-2.1.0.zip.sha256"));
        assert!(!component.matches_asset("CHANGELOG.md"));
    }

    #[test]
    fn test_archive_url_substitution() {
        let component = ManagedComponent::new(
            "skin.auramod",
            Url::parse("https://example.com/latest").unwrap(),
        )
        .with_archive_template("https://github.com/o/skin.auramod/archive/refs/tags/{tag}.zip");

        assert_eq!(
            component.archive_url_for("v1.0").as_deref(),
            Some("https://github.com/o/skin.auramod/archive/refs/tags/v1.0.zip")
        );
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let mut entry = config("skin.auramod");
        entry.archive_url_template = Some("https://example.com/archive.zip".to_string());
        let err = ManagedComponent::from_config(&entry, &PollingConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidComponent { .. }));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let mut entry = config("skin.auramod");
        entry.release_endpoint = "not a url".to_string();
        assert!(ManagedComponent::from_config(&entry, &PollingConfig::default()).is_err());
    }

    #[test]
    fn test_path_like_id_rejected() {
        let entry = config("../escape");
        assert!(ManagedComponent::from_config(&entry, &PollingConfig::default()).is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let runtime = RuntimeConfig {
            components: vec![config("skin.auramod"), config("skin.auramod")],
            ..RuntimeConfig::default()
        };
        let err = runtime.managed_components().unwrap_err();
        assert!(matches!(err, Error::DuplicateComponent { .. }));
    }

    #[test]
    fn test_unknown_component_lookup() {
        let runtime = RuntimeConfig {
            components: vec![config("skin.auramod")],
            ..RuntimeConfig::default()
        };
        assert!(runtime.managed_component("skin.auramod").is_ok());
        assert!(matches!(
            runtime.managed_component("plugin.video.netflix"),
            Err(Error::UnknownComponent { .. })
        ));
    }
}
