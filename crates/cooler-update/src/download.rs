//! Artifact download with retry and integrity checks
//!
//! Downloads stream into `<destination>.part` and are renamed into place once
//! the body is complete, so a failed transfer never leaves a truncated file at
//! the destination. Every artifact gets a SHA256 digest; when the release
//! publishes a `.sha256` sidecar the digest is verified against it.

use anyhow::Context;
use cooler_core::retry::retry_with_policy;
use cooler_core::types::{NetworkConfig, RetryPolicy};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::CONTENT_LENGTH;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Chunk size for hashing (1MB)
const HASH_CHUNK_SIZE: usize = 1024 * 1024;

/// Result of a download operation
#[derive(Debug)]
pub struct DownloadResult {
    /// Path to the downloaded file
    pub file_path: PathBuf,

    /// Size of the downloaded file in bytes
    pub file_size: u64,

    /// SHA256 checksum of the downloaded file
    pub checksum: String,

    /// Whether the checksum was verified against a published digest
    pub verified: bool,
}

/// Errors that can occur while downloading an artifact
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Request could not be sent or the body stream broke
    #[error("Download request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or body transfer exceeded the download timeout
    #[error("Download timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Download of {url} failed with status {status}")]
    Status { url: String, status: u16 },

    /// Local file could not be created, written or moved
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Published checksum file is unreadable
    #[error("Invalid checksum file: {0}")]
    InvalidChecksum(String),

    /// Digest does not match the published checksum
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

impl DownloadError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e)
        } else {
            Self::Network(e)
        }
    }

    fn filesystem(path: &Path, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether another attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Artifact downloader
pub struct ArtifactDownloader {
    /// HTTP client
    client: reqwest::Client,

    /// Retry policy for download operations
    retry_policy: RetryPolicy,

    /// Enable progress bars
    show_progress: bool,
}

impl ArtifactDownloader {
    /// Create a new downloader
    pub fn new(network: &NetworkConfig, retry_policy: RetryPolicy) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .timeout(network.download_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            retry_policy,
            show_progress: false,
        })
    }

    /// Enable or disable progress bars
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Download `url` to `destination`, retrying transient failures
    pub async fn download(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<DownloadResult, DownloadError> {
        self.download_verified(url, destination, None).await
    }

    /// Download `url` to `destination` and verify it against the digest
    /// published at `checksum_url`, if given
    pub async fn download_verified(
        &self,
        url: &str,
        destination: &Path,
        checksum_url: Option<&str>,
    ) -> Result<DownloadResult, DownloadError> {
        info!("Downloading {} -> {}", url, destination.display());

        let mut result = retry_with_policy(
            &self.retry_policy,
            "download",
            DownloadError::is_transient,
            || self.download_once(url, destination),
        )
        .await?;

        if let Some(checksum_url) = checksum_url {
            let expected = self.fetch_expected_checksum(checksum_url).await?;
            if !result.checksum.eq_ignore_ascii_case(&expected) {
                let _ = fs::remove_file(&result.file_path);
                return Err(DownloadError::ChecksumMismatch {
                    expected,
                    actual: result.checksum,
                });
            }
            debug!("Checksum verified for {}", destination.display());
            result.verified = true;
        }

        info!(
            "Download complete: {} ({}, sha256 {})",
            destination.display(),
            human_readable_size(result.file_size),
            result.checksum
        );
        Ok(result)
    }

    /// Single download attempt
    async fn download_once(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<DownloadResult, DownloadError> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| DownloadError::filesystem(parent, e))?;
        }
        let part_path = part_path(destination);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(DownloadError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let total_size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|ct| ct.to_str().ok())
            .and_then(|ct| ct.parse::<u64>().ok());

        let progress = self.progress_bar(total_size, destination);

        let mut file =
            File::create(&part_path).map_err(|e| DownloadError::filesystem(&part_path, e))?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk: bytes::Bytes = chunk_result.map_err(DownloadError::from_reqwest)?;
            file.write_all(&chunk)
                .map_err(|e| DownloadError::filesystem(&part_path, e))?;

            downloaded += chunk.len() as u64;
            if let Some(pb) = &progress {
                pb.set_position(downloaded);
            }
        }
        file.flush()
            .map_err(|e| DownloadError::filesystem(&part_path, e))?;
        drop(file);

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let checksum =
            calculate_checksum(&part_path).map_err(|e| DownloadError::filesystem(&part_path, e))?;

        fs::rename(&part_path, destination)
            .map_err(|e| DownloadError::filesystem(destination, e))?;

        Ok(DownloadResult {
            file_path: destination.to_path_buf(),
            file_size: downloaded,
            checksum,
            verified: false,
        })
    }

    /// Fetch a `.sha256` sidecar and return its digest
    async fn fetch_expected_checksum(&self, checksum_url: &str) -> Result<String, DownloadError> {
        debug!("Fetching checksum from {}", checksum_url);

        let response = self
            .client
            .get(checksum_url)
            .send()
            .await
            .map_err(DownloadError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(DownloadError::Status {
                url: checksum_url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await.map_err(DownloadError::from_reqwest)?;
        parse_checksum_file(&body)
    }

    fn progress_bar(&self, total_size: Option<u64>, destination: &Path) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = match total_size {
            Some(size) => ProgressBar::new(size),
            None => ProgressBar::new_spinner(),
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(format!("Downloading {}", name));
        Some(pb)
    }
}

/// Calculate SHA256 checksum of a file
pub fn calculate_checksum(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Extract the digest from `sha256sum`-style content (`<hex>  <file name>`)
fn parse_checksum_file(content: &str) -> Result<String, DownloadError> {
    let digest = content
        .split_whitespace()
        .next()
        .ok_or_else(|| DownloadError::InvalidChecksum("empty checksum file".to_string()))?;

    if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DownloadError::InvalidChecksum(format!(
            "not a SHA256 digest: {}",
            digest
        )));
    }

    Ok(digest.to_ascii_lowercase())
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Convert bytes to human-readable size
fn human_readable_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}
