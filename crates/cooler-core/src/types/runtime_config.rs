//! Runtime configuration types for operational parameters
//!
//! These types define configuration that controls runtime behavior like
//! network timeouts, retry policies, polling windows, the reconciliation
//! schedule and the set of managed components.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Retry policy for artifact downloads
    #[serde(default)]
    pub download_retry: RetryPolicy,

    /// Visibility polling configuration
    #[serde(default)]
    pub polling: PollingConfig,

    /// Background reconciliation schedule
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Host platform settings
    #[serde(default)]
    pub host: HostConfig,

    /// User-facing notification settings
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// How installed versions are compared against release tags
    #[serde(default)]
    pub version_match: VersionMatch,

    /// Components kept in sync with their upstream releases
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Timeout for release metadata requests in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Download timeout in seconds
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            download_timeout_secs: default_download_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl NetworkConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

fn default_http_timeout() -> u64 {
    30
}
fn default_download_timeout() -> u64 {
    60
}
fn default_user_agent() -> String {
    format!(
        "cooler/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Retry policy for an operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first one)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Retry strategy
    #[serde(default)]
    pub strategy: RetryStrategy,

    /// Backoff multiplier for exponential strategies
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: RetryStrategy::default(),
            backoff_multiplier: default_backoff_multiplier(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            strategy: RetryStrategy::None,
            ..Self::default()
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_initial_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    10000
}

/// Retry strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RetryStrategy {
    /// No retry
    None,

    /// Fixed delay between retries
    FixedDelay,

    /// Exponential backoff (default)
    #[default]
    ExponentialBackoff,

    /// Linear backoff
    LinearBackoff,
}

/// Visibility polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollingConfig {
    /// Interval between presence queries in milliseconds
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,

    /// Default visibility timeout after the primary install, in seconds
    #[serde(default = "default_primary_timeout")]
    pub primary_timeout_secs: u64,

    /// Default visibility timeout after the fallback extraction, in seconds
    #[serde(default = "default_fallback_timeout")]
    pub fallback_timeout_secs: u64,

    /// Delay between the install request and the registry refresh, in milliseconds
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            primary_timeout_secs: default_primary_timeout(),
            fallback_timeout_secs: default_fallback_timeout(),
            settle_delay_ms: default_settle_delay(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

fn default_poll_interval() -> u64 {
    1000
}
fn default_primary_timeout() -> u64 {
    20
}
fn default_fallback_timeout() -> u64 {
    20
}
fn default_settle_delay() -> u64 {
    2000
}

/// Background reconciliation schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScheduleConfig {
    /// Period between background passes in seconds
    #[serde(default = "default_schedule_interval")]
    pub interval_secs: u64,

    /// Disable the background loop entirely
    #[serde(default)]
    pub disabled: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_schedule_interval(),
            disabled: false,
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_schedule_interval() -> u64 {
    6 * 60 * 60
}

/// Host platform settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HostConfig {
    /// Directory holding installed components (defaults to ~/.kodi/addons)
    #[serde(default)]
    pub addons_dir: Option<Utf8PathBuf>,

    /// Scratch directory for downloads and extraction (defaults to ~/.kodi/temp)
    #[serde(default)]
    pub temp_dir: Option<Utf8PathBuf>,

    /// JSON-RPC endpoint used for registry queries and notifications
    #[serde(default)]
    pub jsonrpc_url: Option<String>,

    /// Command (and leading arguments) used to send built-in actions
    #[serde(default = "default_send_command")]
    pub send_command: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            addons_dir: None,
            temp_dir: None,
            jsonrpc_url: None,
            send_command: default_send_command(),
        }
    }
}

fn default_send_command() -> Vec<String> {
    vec!["kodi-send".to_string()]
}

/// Notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NotificationConfig {
    /// Send notifications at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Notification heading
    #[serde(default = "default_notification_title")]
    pub title: String,

    /// Display time in milliseconds
    #[serde(default = "default_notification_duration")]
    pub duration_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            title: default_notification_title(),
            duration_ms: default_notification_duration(),
        }
    }
}

impl NotificationConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

fn default_true() -> bool {
    true
}
fn default_notification_title() -> String {
    "Cooler Build".to_string()
}
fn default_notification_duration() -> u64 {
    5000
}

/// Policy for deciding whether an installed version matches a release tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VersionMatch {
    /// Plain string equality
    Exact,

    /// Ignore a leading `v` and build metadata, compare as semver when possible
    #[default]
    Normalized,
}

impl std::str::FromStr for VersionMatch {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "normalized" => Ok(Self::Normalized),
            other => Err(format!("unknown version match policy: {}", other)),
        }
    }
}

/// A component entry as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ComponentConfig {
    /// Component id as registered by the host (e.g. "skin.auramod")
    pub id: String,

    /// Human readable name used in notifications
    #[serde(default)]
    pub name: Option<String>,

    /// Release metadata endpoint (GitHub "latest release" API URL)
    pub release_endpoint: String,

    /// Glob matched against asset file names
    #[serde(default = "default_asset_pattern")]
    pub asset_pattern: String,

    /// Source archive URL used when no asset matches; `{tag}` is substituted
    #[serde(default)]
    pub archive_url_template: Option<String>,

    /// Re-check on the background schedule after startup
    #[serde(default)]
    pub background: bool,

    /// Override of the primary-tier visibility timeout, in seconds
    #[serde(default)]
    pub primary_timeout_secs: Option<u64>,

    /// Override of the fallback-tier visibility timeout, in seconds
    #[serde(default)]
    pub fallback_timeout_secs: Option<u64>,

    /// Host built-in actions executed once the component is visible after startup
    #[serde(default)]
    pub on_ready: Vec<String>,
}

fn default_asset_pattern() -> String {
    "*.zip".to_string()
}
