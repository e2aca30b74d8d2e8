//! Kodi host adapter
//!
//! Registry queries and notifications go through the JSON-RPC API when an
//! endpoint is configured. Without one, presence and versions are read from
//! `addon.xml` files under the addons directory. Built-in actions
//! (`InstallFromZip`, `UpdateLocalAddons`, skin settings) are always sent
//! through the configured send command, `kodi-send` by default.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use cooler_core::types::{HostConfig, NotificationConfig};
use regex::Regex;
use serde_json::{json, Value};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::host::HostPlatform;

/// Manifest file inside every addon folder
const ADDON_MANIFEST: &str = "addon.xml";

/// Timeout for JSON-RPC calls
const JSONRPC_TIMEOUT: Duration = Duration::from_secs(10);

static ADDON_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<addon\b[^>]*?\bversion\s*=\s*"([^"]+)""#).expect("addon version regex is valid")
});

/// Minimal JSON-RPC 2.0 client for the Kodi web server
struct JsonRpcClient {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    fn new(url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(JSONRPC_TIMEOUT)
            .build()
            .context("Failed to create JSON-RPC client")?;
        Ok(Self {
            client,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!("JSON-RPC {} -> {}", method, self.url);
        let response: Value = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("JSON-RPC request {} failed", method))?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("Invalid JSON-RPC response for {}", method))?;

        if let Some(error) = response.get("error") {
            bail!("JSON-RPC {} returned error: {}", method, error);
        }
        response
            .get("result")
            .cloned()
            .ok_or_else(|| anyhow!("JSON-RPC {} response has no result", method))
    }
}

/// [`HostPlatform`] backed by a local Kodi installation
pub struct KodiHost {
    addons_dir: PathBuf,
    temp_dir: PathBuf,
    send_command: Vec<String>,
    jsonrpc: Option<JsonRpcClient>,
    notification_title: String,
}

impl KodiHost {
    /// Create an adapter, defaulting directories to `~/.kodi/{addons,temp}`
    pub fn from_config(host: &HostConfig, notifications: &NotificationConfig) -> Result<Self> {
        let kodi_home = || -> Result<PathBuf> {
            let home = env::var("HOME").context("Could not determine home directory")?;
            Ok(PathBuf::from(home).join(".kodi"))
        };

        let addons_dir = match &host.addons_dir {
            Some(dir) => dir.clone().into_std_path_buf(),
            None => kodi_home()?.join("addons"),
        };
        let temp_dir = match &host.temp_dir {
            Some(dir) => dir.clone().into_std_path_buf(),
            None => kodi_home()?.join("temp"),
        };

        if host.send_command.is_empty() {
            bail!("host.send-command must name a program");
        }

        let jsonrpc = host
            .jsonrpc_url
            .as_ref()
            .map(|url| JsonRpcClient::new(url.clone()))
            .transpose()?;

        Ok(Self {
            addons_dir,
            temp_dir,
            send_command: host.send_command.clone(),
            jsonrpc,
            notification_title: notifications.title.clone(),
        })
    }

    async fn send_builtin(&self, action: &str) -> Result<()> {
        let (program, args) = self
            .send_command
            .split_first()
            .ok_or_else(|| anyhow!("No send command configured"))?;

        debug!("Running: {} --action={}", program, action);
        let output = Command::new(program)
            .args(args)
            .arg(format!("--action={}", action))
            .output()
            .await
            .with_context(|| format!("Failed to run {}", program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} failed for {}: {}", program, action, stderr.trim());
        }
        Ok(())
    }

    fn manifest_path(&self, component_id: &str) -> PathBuf {
        self.addons_dir.join(component_id).join(ADDON_MANIFEST)
    }

    async fn addon_details(&self, rpc: &JsonRpcClient, component_id: &str) -> Option<Value> {
        match rpc
            .call(
                "Addons.GetAddonDetails",
                json!({ "addonid": component_id, "properties": ["version", "enabled"] }),
            )
            .await
        {
            Ok(result) => result.get("addon").cloned(),
            Err(e) => {
                debug!("{} not registered: {:#}", component_id, e);
                None
            }
        }
    }
}

#[async_trait]
impl HostPlatform for KodiHost {
    fn name(&self) -> &'static str {
        "kodi"
    }

    async fn install_from_archive(&self, archive: &Path) -> Result<()> {
        self.send_builtin(&format!("InstallFromZip({})", archive.display()))
            .await
    }

    async fn is_component_present(&self, component_id: &str) -> bool {
        match &self.jsonrpc {
            Some(rpc) => self.addon_details(rpc, component_id).await.is_some(),
            None => tokio::fs::try_exists(self.manifest_path(component_id))
                .await
                .unwrap_or(false),
        }
    }

    async fn refresh_local_registry(&self) -> Result<()> {
        self.send_builtin("UpdateLocalAddons").await?;
        self.send_builtin("UpdateAddonRepos").await
    }

    async fn installed_version(&self, component_id: &str) -> Option<String> {
        match &self.jsonrpc {
            Some(rpc) => self
                .addon_details(rpc, component_id)
                .await?
                .get("version")?
                .as_str()
                .map(str::to_string),
            None => {
                let manifest = tokio::fs::read_to_string(self.manifest_path(component_id))
                    .await
                    .ok()?;
                parse_addon_version(&manifest)
            }
        }
    }

    fn component_root(&self) -> &Path {
        &self.addons_dir
    }

    fn scratch_root(&self) -> &Path {
        &self.temp_dir
    }

    async fn notify(&self, message: &str, duration: Duration) {
        let millis = duration.as_millis() as u64;
        let result = match &self.jsonrpc {
            Some(rpc) => rpc
                .call(
                    "GUI.ShowNotification",
                    json!({
                        "title": self.notification_title,
                        "message": message,
                        "displaytime": millis,
                    }),
                )
                .await
                .map(|_| ()),
            None => {
                self.send_builtin(&notification_builtin(
                    &self.notification_title,
                    message,
                    millis,
                ))
                .await
            }
        };

        if let Err(e) = result {
            warn!("Notification '{}' not shown: {:#}", message, e);
        }
    }

    async fn execute_builtin(&self, action: &str) -> Result<()> {
        self.send_builtin(action).await
    }
}

/// Read the `version` attribute of the root `<addon>` element
pub fn parse_addon_version(manifest: &str) -> Option<String> {
    ADDON_VERSION_RE
        .captures(manifest)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `Notification(title,message,ms)`; commas would split the arguments
fn notification_builtin(title: &str, message: &str, millis: u64) -> String {
    let clean = |s: &str| s.replace(',', " ");
    format!("Notification({},{},{})", clean(title), clean(message), millis)
}
