//! Key-value store keeping one JSON file per key inside a data directory.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use crate::dao::{
    kv_store::KeyValueStore,
    storage::{StorageError, StorageResult},
};

/// Failures raised by the file backend.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// The data directory could not be created.
    #[error("failed to create data directory `{path}`")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Reading an existing entry failed.
    #[error("failed to read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Writing the temporary file failed.
    #[error("failed to write `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Moving the temporary file over the entry failed.
    #[error("failed to replace `{path}`")]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The data directory exists but is not a directory.
    #[error("`{path}` is not a directory")]
    NotADirectory { path: PathBuf },
}

impl From<FileStoreError> for StorageError {
    fn from(err: FileStoreError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}

/// Filesystem-backed store.
///
/// Writes go to a uniquely named temporary file which is then renamed over the
/// entry, so readers never observe a partially written snapshot.
#[derive(Clone)]
pub struct FileStore {
    dir: Arc<PathBuf>,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Arc::new(dir.into()),
        }
    }

    /// Directory holding the entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }

    async fn read(&self, key: &str) -> Result<Option<String>, FileStoreError> {
        let path = self.entry_path(key);
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FileStoreError::Read { path, source }),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), FileStoreError> {
        fs::create_dir_all(self.dir.as_path())
            .await
            .map_err(|source| FileStoreError::CreateDir {
                path: self.dir.to_path_buf(),
                source,
            })?;

        let path = self.entry_path(key);
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", file_stem(key), Uuid::new_v4().simple()));

        if let Err(source) = fs::write(&tmp, value).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(FileStoreError::Write { path: tmp, source });
        }

        if let Err(source) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(FileStoreError::Replace { path, source });
        }

        Ok(())
    }

    async fn probe(&self) -> Result<(), FileStoreError> {
        match fs::metadata(self.dir.as_path()).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(FileStoreError::NotADirectory {
                path: self.dir.to_path_buf(),
            }),
            // Not created yet: the first write will create it.
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(FileStoreError::Read {
                path: self.dir.to_path_buf(),
                source,
            }),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        let key = key.to_string();
        Box::pin(async move { store.read(&key).await.map_err(Into::into) })
    }

    fn put(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let key = key.to_string();
        Box::pin(async move { store.write(&key, &value).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.probe().await.map_err(Into::into) })
    }
}

/// Map a logical key such as `scorekeep:v1` to a portable file name.
///
/// Bytes outside `[A-Za-z0-9._-]` are percent-encoded, so distinct keys get distinct files.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.') {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("%{byte:02X}"));
        }
    }
    stem
}
