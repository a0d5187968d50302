// # File Config Store
//
// JSON file implementation of ConfigStore with crash recovery.
//
// ## Crash Recovery
//
// - Atomic writes: write to a sibling with the extension replaced by `.tmp`
//   (`config.json` -> `config.tmp`), then rename over the file
// - Automatic backup: the previous file is copied to `config.backup` first
// - Recovery: if the main file does not parse, the backup is loaded and
//   copied back into place
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "config": {
//     "provider": "ovh",
//     "domain": "home.example.com",
//     "credentials": { "identifier": "user", "secret": "..." },
//     "interval_secs": 300,
//     "custom_ip_endpoint": null
//   }
// }
// ```
//
// The file holds the provider secret. On unix the file and its backup are
// created with mode 0600.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Error;
use crate::config::MonitorConfig;
use crate::traits::config_store::ConfigStore;

/// Config file format version
const CONFIG_FILE_VERSION: &str = "1.0";

/// File-backed configuration store
///
/// # Example
///
/// ```rust,no_run
/// use dyndns_core::store::FileConfigStore;
/// use dyndns_core::ConfigStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileConfigStore::new("/var/lib/dyndns/config.json").await?;
///
///     if let Some(config) = store.load().await? {
///         println!("monitoring {}", config.domain);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    // Serializes writers so temp/backup files are never shared
    write_lock: Mutex<()>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct ConfigFileFormat {
    version: String,
    config: MonitorConfig,
}

impl FileConfigStore {
    /// Open a store at `path`, creating parent directories if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create config directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the main file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(path: &Path) -> Result<Option<MonitorConfig>, Error> {
        if !path.exists() {
            tracing::debug!("Config file does not exist: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::config_store(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let file: ConfigFileFormat = serde_json::from_str(&content)?;
        if file.version != CONFIG_FILE_VERSION {
            tracing::warn!(
                "Config file version mismatch: expected {}, got {}. Attempting to load anyway.",
                CONFIG_FILE_VERSION,
                file.version
            );
        }

        Ok(Some(file.config))
    }

    async fn recover_from_backup(&self) -> Result<Option<MonitorConfig>, Error> {
        let backup_path = Self::backup_path(&self.path);
        if !backup_path.exists() {
            tracing::warn!("No backup config file found. Starting without configuration.");
            return Ok(None);
        }

        match Self::read_file(&backup_path).await {
            Ok(config) => {
                tracing::info!("Recovered configuration from backup");
                if let Err(e) = fs::copy(&backup_path, &self.path).await {
                    tracing::error!("Failed to restore config file from backup: {}", e);
                }
                Ok(config)
            }
            Err(e) => {
                tracing::error!("Backup also corrupted: {}. Starting without configuration.", e);
                Ok(None)
            }
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// Create or truncate `path`, readable by the owner only
    async fn open_private(path: &Path) -> std::io::Result<fs::File> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let file = options.open(path).await?;
        // An existing temp file keeps its old mode
        restrict_permissions(path).await?;
        Ok(file)
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self) -> Result<Option<MonitorConfig>, Error> {
        match Self::read_file(&self.path).await {
            Ok(config) => Ok(config),
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Config file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );
                self.recover_from_backup().await
            }
            Err(e) => Err(e),
        }
    }

    async fn save(&self, config: &MonitorConfig) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;

        let file = ConfigFileFormat {
            version: CONFIG_FILE_VERSION.to_string(),
            config: config.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let temp_path = self.temp_path();
        {
            let mut out = Self::open_private(&temp_path).await.map_err(|e| {
                Error::config_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            out.write_all(json.as_bytes()).await?;
            out.flush().await?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            match fs::copy(&self.path, &backup_path).await {
                Ok(_) => restrict_permissions(&backup_path).await?,
                Err(e) => tracing::warn!("Failed to create config backup: {}", e),
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::config_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Config written to file: {}", self.path.display());
        Ok(())
    }
}
