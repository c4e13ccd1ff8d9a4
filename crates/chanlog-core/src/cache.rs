use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use chanlog_log::{LogEntry, OpKind, Operation};
use chanlog_store::ContentStore;
use chanlog_types::ContentHash;
use futures_util::{stream, StreamExt, TryStreamExt};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::DEFAULT_FETCH_CONCURRENCY;
use crate::error::{CoreError, CoreResult};

/// A decoded operation tagged with the hash of its payload.
///
/// `key` is never empty: keyless operations (`Add`) take their payload hash
/// as key, so every `Add` is independently addressable.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CachedPayload {
    pub hash: ContentHash,
    pub key: String,
    pub op: OpKind,
    pub value: Value,
}

impl CachedPayload {
    pub fn from_operation(hash: ContentHash, operation: Operation) -> Self {
        Self {
            hash,
            key: operation.key.unwrap_or_else(|| hash.to_hex()),
            op: operation.op,
            value: operation.value,
        }
    }

    /// Decode a stored payload body.
    pub fn decode(hash: ContentHash, data: &[u8]) -> CoreResult<Self> {
        let operation: Operation =
            serde_json::from_slice(data).map_err(|e| CoreError::Decode {
                hash,
                reason: e.to_string(),
            })?;
        Ok(Self::from_operation(hash, operation))
    }
}

/// Process-wide map from payload hash to decoded operation.
///
/// Append-only: entries are never evicted or overwritten, and there is at
/// most one entry per hash. Shared by every channel of a registry; payloads
/// are content-addressed, so sharing cannot mix channels up.
#[derive(Debug)]
pub struct PayloadCache {
    entries: RwLock<HashMap<ContentHash, Arc<CachedPayload>>>,
    concurrency: usize,
}

impl Default for PayloadCache {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_CONCURRENCY)
    }
}

impl PayloadCache {
    /// A cache that fetches at most `concurrency` payloads at once.
    pub fn new(concurrency: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            concurrency: concurrency.max(1),
        }
    }

    pub fn get(&self, hash: &ContentHash) -> Option<Arc<CachedPayload>> {
        self.read().get(hash).cloned()
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.read().contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Add `payload` unless its hash is already cached. Returns whether it
    /// was added.
    pub fn insert(&self, payload: CachedPayload) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&payload.hash) {
            return false;
        }
        entries.insert(payload.hash, Arc::new(payload));
        true
    }

    /// Payload hashes referenced by `entries` that are not cached yet, in
    /// first-seen order and without duplicates.
    pub fn missing(&self, entries: &[LogEntry]) -> Vec<ContentHash> {
        let cached = self.read();
        let mut seen = HashSet::new();
        entries
            .iter()
            .map(|e| e.payload)
            .filter(|hash| !cached.contains_key(hash) && seen.insert(*hash))
            .collect()
    }

    /// Fetch, decode, and cache every payload of `entries` not yet cached.
    ///
    /// At most `concurrency` fetches are in flight at once. The first fetch
    /// or decode failure aborts the batch and is returned; payloads decoded
    /// before the failure stay cached. Returns the number of payloads added.
    pub async fn populate(&self, store: &dyn ContentStore, entries: &[LogEntry]) -> CoreResult<usize> {
        let missing = self.missing(entries);
        if missing.is_empty() {
            return Ok(0);
        }
        let wanted = missing.len();

        let mut added = 0;
        stream::iter(missing)
            .map(|hash| async move {
                let object = store.get(&hash).await?;
                CachedPayload::decode(hash, &object.data)
            })
            .buffer_unordered(self.concurrency)
            .try_for_each(|payload| {
                if self.insert(payload) {
                    added += 1;
                }
                futures_util::future::ready(Ok(()))
            })
            .await?;

        debug!(wanted, added, "payload cache populated");
        Ok(added)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<ContentHash, Arc<CachedPayload>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chanlog_log::PayloadRecord;
    use chanlog_store::{InMemoryContentStore, StoreResult, StoredObject};
    use serde_json::json;

    /// Store wrapper that records the peak number of concurrent `get`s.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryContentStore,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        gets: AtomicUsize,
    }

    #[async_trait]
    impl ContentStore for CountingStore {
        async fn get(&self, hash: &ContentHash) -> StoreResult<StoredObject> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.gets.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.inner.get(hash).await
        }

        async fn put(&self, object: StoredObject) -> StoreResult<ContentHash> {
            self.inner.put(object).await
        }

        async fn exists(&self, hash: &ContentHash) -> StoreResult<bool> {
            self.inner.exists(hash).await
        }
    }

    async fn store_put(store: &dyn ContentStore, op: Operation, clock: u64) -> LogEntry {
        let record = PayloadRecord::new(op, "alice", clock);
        let bytes = serde_json::to_vec(&record).unwrap();
        let payload = store.put(StoredObject::payload(bytes)).await.unwrap();
        LogEntry::new(payload, "alice", clock)
    }

    #[test]
    fn keyless_payload_uses_hash_as_key() {
        let hash = ContentHash::from_bytes(b"p");
        let cached = CachedPayload::from_operation(hash, Operation::add(json!(1)));
        assert_eq!(cached.key, hash.to_hex());

        let keyed = CachedPayload::from_operation(hash, Operation::put("k", json!(1)));
        assert_eq!(keyed.key, "k");
    }

    #[test]
    fn decode_rejects_malformed_json() {
        let hash = ContentHash::from_bytes(b"bad");
        assert!(matches!(
            CachedPayload::decode(hash, b"{ nope"),
            Err(CoreError::Decode { .. })
        ));
    }

    #[test]
    fn insert_never_overwrites() {
        let cache = PayloadCache::default();
        let hash = ContentHash::from_bytes(b"p");
        assert!(cache.insert(CachedPayload::from_operation(hash, Operation::put("k", json!(1)))));
        assert!(!cache.insert(CachedPayload::from_operation(hash, Operation::put("k", json!(2)))));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&hash).unwrap().value, json!(1));
    }

    #[test]
    fn missing_skips_cached_and_duplicates() {
        let cache = PayloadCache::default();
        let a = ContentHash::from_bytes(b"a");
        let b = ContentHash::from_bytes(b"b");
        cache.insert(CachedPayload::from_operation(a, Operation::put("a", json!(1))));

        let entries = vec![
            LogEntry::new(a, "alice", 1),
            LogEntry::new(b, "alice", 2),
            LogEntry::new(b, "bob", 2),
        ];
        assert_eq!(cache.missing(&entries), vec![b]);
    }

    #[tokio::test]
    async fn populate_decodes_and_caches() {
        let store = InMemoryContentStore::new();
        let e1 = store_put(&store, Operation::put("k", json!("v")), 1).await;
        let e2 = store_put(&store, Operation::add(json!("x")), 2).await;

        let cache = PayloadCache::default();
        let added = cache.populate(&store, &[e1.clone(), e2.clone()]).await.unwrap();
        assert_eq!(added, 2);

        let put = cache.get(&e1.payload).unwrap();
        assert_eq!((put.key.as_str(), put.op), ("k", OpKind::Put));
        assert_eq!(cache.get(&e2.payload).unwrap().key, e2.payload.to_hex());
    }

    #[tokio::test]
    async fn populate_twice_fetches_nothing_new() {
        let store = CountingStore::default();
        let e1 = store_put(&store, Operation::put("k", json!(1)), 1).await;

        let cache = PayloadCache::default();
        assert_eq!(cache.populate(&store, &[e1.clone()]).await.unwrap(), 1);
        assert_eq!(cache.populate(&store, &[e1]).await.unwrap(), 0);
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn populate_bounds_concurrent_fetches() {
        let store = CountingStore::default();
        let mut entries = Vec::new();
        for i in 0..12u64 {
            entries.push(store_put(&store, Operation::put(format!("k{i}"), json!(i)), i + 1).await);
        }

        let cache = PayloadCache::new(4);
        assert_eq!(cache.populate(&store, &entries).await.unwrap(), 12);

        let peak = store.peak.load(Ordering::SeqCst);
        assert!(peak <= 4, "peak concurrency {peak} exceeds 4");
        assert!(peak > 1, "fetches never overlapped");
        assert_eq!(store.gets.load(Ordering::SeqCst), 12);
    }

    #[tokio::test]
    async fn populate_fails_on_missing_payload() {
        let store = InMemoryContentStore::new();
        let good = store_put(&store, Operation::put("k", json!(1)), 1).await;
        let dangling = LogEntry::new(ContentHash::from_bytes(b"absent"), "alice", 2);

        let cache = PayloadCache::default();
        let err = cache.populate(&store, &[good, dangling.clone()]).await.unwrap_err();
        assert!(matches!(err, CoreError::Store(_)));
        assert!(!cache.contains(&dangling.payload));
    }

    #[tokio::test]
    async fn populate_fails_on_undecodable_payload() {
        let store = InMemoryContentStore::new();
        let payload = store
            .put(StoredObject::payload(b"not json".to_vec()))
            .await
            .unwrap();
        let cache = PayloadCache::default();
        let err = cache
            .populate(&store, &[LogEntry::new(payload, "alice", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Decode { .. }));
        assert!(cache.is_empty());
    }
}
