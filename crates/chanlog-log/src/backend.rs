use async_trait::async_trait;
use chanlog_store::{ContentStore, ObjectKind, StoredObject};
use chanlog_types::{ContentHash, Identity};
use tracing::debug;

use crate::error::{LogError, LogResult};
use crate::log::LogHandle;

/// Create/load/snapshot boundary for channel logs.
#[async_trait]
pub trait LogBackend: Send + Sync {
    /// Open a fresh log scoped to `identity`.
    async fn create(&self, store: &dyn ContentStore, identity: &Identity) -> LogResult<LogHandle>;

    /// Load the log snapshot stored under `hash`.
    async fn from_hash(&self, store: &dyn ContentStore, hash: &ContentHash)
        -> LogResult<LogHandle>;

    /// Persist `log` as a snapshot and return its content hash (the head).
    async fn head_hash(&self, store: &dyn ContentStore, log: &LogHandle)
        -> LogResult<ContentHash>;
}

/// Stock backend: snapshots are JSON objects in the content store.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentLog;

#[async_trait]
impl LogBackend for ContentLog {
    async fn create(&self, _store: &dyn ContentStore, identity: &Identity) -> LogResult<LogHandle> {
        Ok(LogHandle::new(identity.name()))
    }

    async fn from_hash(
        &self,
        store: &dyn ContentStore,
        hash: &ContentHash,
    ) -> LogResult<LogHandle> {
        let object = store.get(hash).await?;
        if object.kind != ObjectKind::Snapshot {
            return Err(LogError::NotASnapshot {
                hash: *hash,
                kind: object.kind,
            });
        }
        let log = LogHandle::from_snapshot_bytes(hash, &object.data)?;
        debug!(head = %hash.short_hex(), entries = log.len(), "log snapshot loaded");
        Ok(log)
    }

    async fn head_hash(
        &self,
        store: &dyn ContentStore,
        log: &LogHandle,
    ) -> LogResult<ContentHash> {
        let bytes = log.to_snapshot_bytes()?;
        Ok(store.put(StoredObject::snapshot(bytes)).await?)
    }
}
