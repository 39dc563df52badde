pub mod file;
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::storage::StorageResult;

/// Abstraction over a string key-value medium holding serialized snapshots.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`, `None` when nothing was written yet.
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// Overwrite the value stored under `key`.
    fn put(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Probe the backend without touching stored data.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
