use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::{
    kv_store::KeyValueStore,
    storage::{StorageError, StorageResult},
};

/// Process-local store, lost on exit. Used for ephemeral sessions and tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Unbounded in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects values longer than `bytes`, mimicking a browser storage quota.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Arc::default(),
            quota: Some(bytes),
        }
    }

    /// Seed a raw value, bypassing the quota.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Peek at the raw value stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let value = self.raw(key);
        Box::pin(async move { Ok(value) })
    }

    fn put(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let key = key.to_string();
        Box::pin(async move {
            if let Some(limit) = store.quota {
                if value.len() > limit {
                    return Err(StorageError::rejected(
                        key,
                        format!("quota of {limit} bytes exceeded ({} bytes)", value.len()),
                    ));
                }
            }
            store.entries.insert(key, value);
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
