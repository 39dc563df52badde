use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    dao::{
        kv_store::KeyValueStore,
        models::{decode_session, encode_session},
    },
    state::session::{Session, now_millis},
};

/// Key used when the configuration does not override it.
pub const DEFAULT_STORAGE_KEY: &str = "scorekeep:v1";

/// Best-effort persistence of the session snapshot under a single key.
///
/// Neither operation fails outward: unreadable data loads as absent and write
/// failures are only logged, the in-memory session stays authoritative.
#[derive(Clone)]
pub struct SessionRepository {
    store: Arc<dyn KeyValueStore>,
    key: Arc<str>,
}

impl SessionRepository {
    /// Persist under `key` in `store`.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Storage key this repository reads and writes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Underlying backend.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Read the stored session, `None` when missing or unreadable.
    pub async fn load(&self) -> Option<Session> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!(key = %self.key, "no stored session");
                return None;
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read stored session");
                return None;
            }
        };

        match decode_session(&raw, now_millis()) {
            Ok(session) => {
                info!(key = %self.key, players = session.len(), "restored stored session");
                Some(session)
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "ignoring malformed stored session");
                None
            }
        }
    }

    /// Load the stored session or fall back to a fresh one.
    pub async fn load_or_default(&self) -> Session {
        self.load().await.unwrap_or_default()
    }

    /// Overwrite the stored snapshot. Returns whether the write succeeded.
    pub async fn save(&self, session: &Session) -> bool {
        let raw = match encode_session(session) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to encode session");
                return false;
            }
        };

        match self.store.put(&self.key, raw).await {
            Ok(()) => {
                debug!(key = %self.key, players = session.len(), "session saved");
                true
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to save session; keeping it in memory");
                false
            }
        }
    }
}
