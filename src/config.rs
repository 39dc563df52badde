//! Application-level configuration loading: which key-value backend holds the
//! session, under which key, and how deep the SSE buffers are.

use std::{env, fs, io::ErrorKind, path::PathBuf, sync::Arc};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    dao::{
        kv_store::{KeyValueStore, file::FileStore, memory::MemoryStore},
        session_repository::DEFAULT_STORAGE_KEY,
        storage::StorageError,
    },
    state::DEFAULT_SSE_CAPACITY,
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SCOREKEEP_CONFIG_PATH";
/// Directory used by the file backend when none is configured.
const DEFAULT_DATA_DIR: &str = "data";

/// Failures raised while turning the configuration into live components.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configured backend failed its startup probe.
    #[error("storage backend `{backend}` is not usable")]
    Storage {
        /// Name of the configured backend.
        backend: &'static str,
        #[source]
        source: StorageError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
/// Key-value backend holding the serialized session.
pub enum StorageConfig {
    /// Process memory; lost on restart.
    Memory,
    /// One JSON file per key under `dir`.
    File {
        #[serde(default = "default_data_dir")]
        dir: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File {
            dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    fn name(&self) -> &'static str {
        match self {
            StorageConfig::Memory => "memory",
            StorageConfig::File { .. } => "file",
        }
    }

    /// Instantiate the configured backend and probe it once.
    pub async fn open(&self) -> Result<Arc<dyn KeyValueStore>, ConfigError> {
        let store: Arc<dyn KeyValueStore> = match self {
            StorageConfig::Memory => {
                warn!("using in-memory storage; the session will not survive a restart");
                Arc::new(MemoryStore::new())
            }
            StorageConfig::File { dir } => {
                info!(dir = %dir.display(), "using file storage");
                Arc::new(FileStore::new(dir.clone()))
            }
        };

        store
            .health_check()
            .await
            .map_err(|source| ConfigError::Storage {
                backend: self.name(),
                source,
            })?;
        Ok(store)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Key under which the session snapshot is stored.
    pub storage_key: String,
    /// Backend holding the snapshot.
    pub storage: StorageConfig,
    /// Buffered events per SSE subscriber before it starts lagging.
    pub sse_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage: StorageConfig::default(),
            sse_capacity: DEFAULT_SSE_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        backend = app_config.storage.name(),
                        storage_key = %app_config.storage_key,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document, filling omitted fields with defaults.
    pub fn parse(contents: &str) -> serde_json::Result<Self> {
        let mut config: Self = serde_json::from_str(contents)?;
        if config.storage_key.trim().is_empty() {
            config.storage_key = DEFAULT_STORAGE_KEY.to_string();
        }
        Ok(config)
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
