use async_trait::async_trait;
use chanlog_types::ContentHash;

use crate::error::StoreResult;
use crate::object::StoredObject;

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written: the same kind and data always
///   produce the same hash.
/// - `put` is idempotent.
/// - `get` fails with [`StoreError::NotFound`](crate::StoreError::NotFound)
///   for unknown hashes rather than returning an empty object.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch an object by its content hash.
    async fn get(&self, hash: &ContentHash) -> StoreResult<StoredObject>;

    /// Store an object and return its content hash.
    async fn put(&self, object: StoredObject) -> StoreResult<ContentHash>;

    /// Check whether an object exists in the store.
    async fn exists(&self, hash: &ContentHash) -> StoreResult<bool>;
}
