use std::collections::HashMap;

use async_trait::async_trait;
use chanlog_types::ContentHash;
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ContentStore;

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. Objects are cloned on read and write.
pub struct InMemoryContentStore {
    objects: RwLock<HashMap<ContentHash, StoredObject>>,
}

impl InMemoryContentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Returns `true` if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn get(&self, hash: &ContentHash) -> StoreResult<StoredObject> {
        self.objects
            .read()
            .await
            .get(hash)
            .cloned()
            .ok_or(StoreError::NotFound(*hash))
    }

    async fn put(&self, object: StoredObject) -> StoreResult<ContentHash> {
        let hash = object.compute_hash();
        self.objects.write().await.entry(hash).or_insert(object);
        Ok(hash)
    }

    async fn exists(&self, hash: &ContentHash) -> StoreResult<bool> {
        Ok(self.objects.read().await.contains_key(hash))
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore").finish_non_exhaustive()
    }
}
