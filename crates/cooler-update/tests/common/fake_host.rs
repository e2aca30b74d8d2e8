//! Recording in-memory host platform
//!
//! The registry is a map of component id to version. A registry refresh
//! registers every folder under the component root that carries an
//! `addon.xml`, keyed by folder name. A working install primitive writes that
//! manifest and registers it at once, the way the real host unpacks an
//! archive into its addons folder.

use anyhow::{bail, Result};
use async_trait::async_trait;
use cooler_update::kodi::parse_addon_version;
use cooler_update::HostPlatform;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// What the host install primitive does with an archive
#[derive(Debug, Clone)]
pub enum PrimaryBehavior {
    /// Places `id` at `version` on disk and registers it
    Installs { id: String, version: String },

    /// Accepts the request but never installs anything
    Ignores,

    /// Refuses the request
    Rejects,
}

pub struct FakeHost {
    _dir: TempDir,
    addons: PathBuf,
    scratch: PathBuf,
    primary: PrimaryBehavior,
    registry: Mutex<HashMap<String, String>>,
    install_requests: Mutex<Vec<PathBuf>>,
    refreshes: AtomicUsize,
    notifications: Mutex<Vec<String>>,
    builtins: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn new(primary: PrimaryBehavior) -> Self {
        let dir = TempDir::new().expect("create fake host dir");
        let addons = dir.path().join("addons");
        let scratch = dir.path().join("temp");
        fs::create_dir_all(&addons).expect("create addons dir");

        Self {
            _dir: dir,
            addons,
            scratch,
            primary,
            registry: Mutex::new(HashMap::new()),
            install_requests: Mutex::new(Vec::new()),
            refreshes: AtomicUsize::new(0),
            notifications: Mutex::new(Vec::new()),
            builtins: Mutex::new(Vec::new()),
        }
    }

    /// Host whose install primitive works for `id`
    pub fn installing(id: &str, version: &str) -> Self {
        Self::new(PrimaryBehavior::Installs {
            id: id.to_string(),
            version: version.to_string(),
        })
    }

    /// Host whose install primitive silently does nothing
    pub fn ignoring() -> Self {
        Self::new(PrimaryBehavior::Ignores)
    }

    /// Mark a component as installed, with its folder on disk
    pub fn with_installed(self, id: &str, version: &str) -> Self {
        write_manifest(&self.addons, id, version).expect("write addon.xml");
        self.registry
            .lock()
            .unwrap()
            .insert(id.to_string(), version.to_string());
        self
    }

    pub fn addons_dir(&self) -> &Path {
        &self.addons
    }

    pub fn install_requests(&self) -> Vec<PathBuf> {
        self.install_requests.lock().unwrap().clone()
    }

    pub fn install_count(&self) -> usize {
        self.install_requests.lock().unwrap().len()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn notifications(&self) -> Vec<String> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn builtins(&self) -> Vec<String> {
        self.builtins.lock().unwrap().clone()
    }

    pub fn registered_version(&self, id: &str) -> Option<String> {
        self.registry.lock().unwrap().get(id).cloned()
    }

    /// Entries left in the scratch root whose name starts with `prefix`
    pub fn scratch_entries(&self, prefix: &str) -> Vec<String> {
        match fs::read_dir(&self.scratch) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| name.starts_with(prefix))
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn write_manifest(addons: &Path, id: &str, version: &str) -> std::io::Result<()> {
    let folder = addons.join(id);
    fs::create_dir_all(&folder)?;
    fs::write(
        folder.join("addon.xml"),
        format!(r#"<addon id="{}" version="{}"/>"#, id, version),
    )
}

#[async_trait]
impl HostPlatform for FakeHost {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn install_from_archive(&self, archive: &Path) -> Result<()> {
        self.install_requests
            .lock()
            .unwrap()
            .push(archive.to_path_buf());

        match &self.primary {
            PrimaryBehavior::Installs { id, version } => {
                write_manifest(&self.addons, id, version)?;
                self.registry
                    .lock()
                    .unwrap()
                    .insert(id.clone(), version.clone());
                Ok(())
            }
            PrimaryBehavior::Ignores => Ok(()),
            PrimaryBehavior::Rejects => bail!("install primitive unavailable"),
        }
    }

    async fn is_component_present(&self, component_id: &str) -> bool {
        self.registry.lock().unwrap().contains_key(component_id)
    }

    async fn refresh_local_registry(&self) -> Result<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);

        let mut registry = self.registry.lock().unwrap();
        for entry in fs::read_dir(&self.addons)? {
            let entry = entry?;
            let manifest = entry.path().join("addon.xml");
            if let Ok(content) = fs::read_to_string(&manifest) {
                if let Some(version) = parse_addon_version(&content) {
                    let id = entry.file_name().to_string_lossy().into_owned();
                    registry.insert(id, version);
                }
            }
        }
        Ok(())
    }

    async fn installed_version(&self, component_id: &str) -> Option<String> {
        self.registered_version(component_id)
    }

    fn component_root(&self) -> &Path {
        &self.addons
    }

    fn scratch_root(&self) -> &Path {
        &self.scratch
    }

    async fn notify(&self, message: &str, _duration: Duration) {
        self.notifications.lock().unwrap().push(message.to_string());
    }

    async fn execute_builtin(&self, action: &str) -> Result<()> {
        self.builtins.lock().unwrap().push(action.to_string());
        Ok(())
    }
}
