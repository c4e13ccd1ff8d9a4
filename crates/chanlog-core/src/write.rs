use chanlog_log::{AppendedOperation, Operation};
use chanlog_types::ContentHash;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::Action;
use crate::cache::CachedPayload;
use crate::channel::OpenLog;
use crate::error::{CoreError, CoreResult};
use crate::registry::ChannelRegistry;

impl ChannelRegistry {
    /// Append a keyless value. Its payload hash becomes its key.
    pub async fn add(&self, channel: &str, password: &str, value: Value) -> CoreResult<ContentHash> {
        self.write(channel, password, Operation::add(value)).await
    }

    /// Set `key` to `value`.
    pub async fn put(
        &self,
        channel: &str,
        password: &str,
        key: impl Into<String>,
        value: Value,
    ) -> CoreResult<ContentHash> {
        self.write(channel, password, Operation::put(key, value)).await
    }

    /// Tombstone `key`.
    pub async fn del(
        &self,
        channel: &str,
        password: &str,
        key: impl Into<String>,
    ) -> CoreResult<ContentHash> {
        self.write(channel, password, Operation::del(key)).await
    }

    /// Append `operation` to `channel` and return its payload hash.
    ///
    /// The log lock is held from append through head persistence. If any of
    /// those steps fails the log is restored to its state before the append,
    /// so no entry exists without a cached payload. The `Write` notification
    /// comes last.
    pub async fn write(
        &self,
        channel: &str,
        password: &str,
        operation: Operation,
    ) -> CoreResult<ContentHash> {
        let ch = self.open_channel(channel)?;
        self.authorize(channel, password, Action::Write).await?;

        let (appended, head) = {
            let mut guard = ch.log.write().await;
            let open = guard
                .as_mut()
                .ok_or_else(|| CoreError::ChannelNotOpen(channel.to_string()))?;
            let before = open.handle.clone();
            match self.append(channel, open, operation).await {
                Ok(done) => done,
                Err(e) => {
                    open.handle = before;
                    warn!(channel, error = %e, "write rolled back");
                    return Err(e);
                }
            }
        };

        ch.set_last_write(Some(head));
        let payload = appended.entry.payload;
        let op = appended.operation.op;
        self.cache
            .insert(CachedPayload::from_operation(payload, appended.operation));
        ch.emit_write(head);

        info!(channel, %op, payload = %payload.short_hex(), head = %head.short_hex(), "write");
        Ok(payload)
    }

    async fn append(
        &self,
        channel: &str,
        open: &mut OpenLog,
        operation: Operation,
    ) -> CoreResult<(AppendedOperation, ContentHash)> {
        let appended = self
            .factory
            .create(self.store.as_ref(), &mut open.handle, &open.identity, operation)
            .await?;
        let head = self
            .backend
            .head_hash(self.store.as_ref(), &open.handle)
            .await?;
        if let Some(heads) = &self.heads {
            heads.set(channel, head)?;
        }
        Ok((appended, head))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chanlog_log::{ContentLog, LogBackend, LogError, LogHandle, LogResult, OpKind, OperationFactory};
    use chanlog_refs::{HeadStore, InMemoryHeadStore};
    use chanlog_store::{ContentStore, InMemoryContentStore};
    use chanlog_types::Identity;
    use serde_json::json;

    use super::*;
    use crate::event::ChannelEvent;
    use crate::query::{QueryOptions, QueryResult};

    async fn open() -> ChannelRegistry {
        let reg = ChannelRegistry::new(Arc::new(InMemoryContentStore::new()));
        reg.use_channel("chat", Identity::new("alice").unwrap())
            .await
            .unwrap();
        reg
    }

    async fn get(reg: &ChannelRegistry, key: &str) -> QueryResult {
        reg.query("chat", "", &QueryOptions::key(key)).await.unwrap()
    }

    struct FailingFactory;

    #[async_trait]
    impl OperationFactory for FailingFactory {
        async fn create(
            &self,
            _: &dyn ContentStore,
            _: &mut LogHandle,
            _: &Identity,
            _: Operation,
        ) -> LogResult<AppendedOperation> {
            Err(LogError::Serialization("factory offline".into()))
        }
    }

    /// Fails the first head recomputation after being armed.
    #[derive(Default)]
    struct FlakyBackend {
        armed: AtomicBool,
    }

    #[async_trait]
    impl LogBackend for FlakyBackend {
        async fn create(&self, s: &dyn ContentStore, identity: &Identity) -> LogResult<LogHandle> {
            ContentLog.create(s, identity).await
        }

        async fn from_hash(&self, s: &dyn ContentStore, h: &ContentHash) -> LogResult<LogHandle> {
            ContentLog.from_hash(s, h).await
        }

        async fn head_hash(&self, s: &dyn ContentStore, l: &LogHandle) -> LogResult<ContentHash> {
            if self.armed.swap(false, Ordering::SeqCst) {
                return Err(LogError::Serialization("snapshot write failed".into()));
            }
            ContentLog.head_hash(s, l).await
        }
    }

    #[tokio::test]
    async fn write_then_read() {
        let reg = open().await;
        reg.put("chat", "", "k", json!("v1")).await.unwrap();
        assert_eq!(get(&reg, "k").await, QueryResult::Values(vec![json!("v1")]));
    }

    #[tokio::test]
    async fn last_write_wins() {
        let reg = open().await;
        reg.put("chat", "", "k", json!("v1")).await.unwrap();
        reg.put("chat", "", "k", json!("v2")).await.unwrap();
        assert_eq!(get(&reg, "k").await, QueryResult::Values(vec![json!("v2")]));
    }

    #[tokio::test]
    async fn delete_tombstones_key() {
        let reg = open().await;
        reg.put("chat", "", "k", json!("v1")).await.unwrap();
        reg.del("chat", "", "k").await.unwrap();
        assert_eq!(get(&reg, "k").await, QueryResult::Values(vec![]));
    }

    #[tokio::test]
    async fn add_is_addressable_by_payload_hash() {
        let reg = open().await;
        let first = reg.add("chat", "", json!("same")).await.unwrap();
        let second = reg.add("chat", "", json!("same")).await.unwrap();
        assert_ne!(first, second);

        assert_eq!(get(&reg, &first.to_hex()).await.values(), vec![&json!("same")]);
        let cached = reg.cache().get(&second).unwrap();
        assert_eq!((cached.key.clone(), cached.op), (second.to_hex(), OpKind::Add));
    }

    #[tokio::test]
    async fn write_updates_head_and_notifies_last() {
        let store = Arc::new(InMemoryContentStore::new());
        let heads = Arc::new(InMemoryHeadStore::new());
        let reg = ChannelRegistry::new(store).with_heads(heads.clone());
        reg.use_channel("chat", Identity::new("alice").unwrap())
            .await
            .unwrap();
        let mut rx = reg.subscribe("chat").unwrap();

        let payload = reg.put("chat", "", "k", json!(1)).await.unwrap();
        let head = reg.head("chat").unwrap();
        assert_eq!(heads.get("chat").unwrap(), Some(head));
        assert!(reg.cache().contains(&payload));
        assert_eq!(
            rx.try_recv().unwrap(),
            ChannelEvent::Write { channel: "chat".into(), head }
        );
    }

    #[tokio::test]
    async fn each_write_moves_the_head() {
        let reg = open().await;
        reg.put("chat", "", "k", json!(1)).await.unwrap();
        let h1 = reg.head("chat").unwrap();
        reg.put("chat", "", "k", json!(1)).await.unwrap();
        assert_ne!(reg.head("chat").unwrap(), h1);
        assert_eq!(reg.entry_count("chat").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn write_to_unopened_channel_fails() {
        let reg = ChannelRegistry::new(Arc::new(InMemoryContentStore::new()));
        assert!(matches!(
            reg.put("chat", "", "k", json!(1)).await,
            Err(CoreError::ChannelNotOpen(_))
        ));
    }

    #[tokio::test]
    async fn factory_failure_leaves_no_trace() {
        let reg = ChannelRegistry::new(Arc::new(InMemoryContentStore::new()))
            .with_factory(Arc::new(FailingFactory));
        reg.use_channel("chat", Identity::new("alice").unwrap())
            .await
            .unwrap();
        let mut rx = reg.subscribe("chat").unwrap();

        assert!(matches!(
            reg.put("chat", "", "k", json!(1)).await,
            Err(CoreError::Log(_))
        ));
        assert_eq!(reg.cache_len(), 0);
        assert_eq!(reg.head("chat"), None);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn concurrent_writes_all_land() {
        let reg = Arc::new(open().await);
        let mut tasks = Vec::new();
        for i in 0..16 {
            let reg = reg.clone();
            tasks.push(tokio::spawn(async move {
                reg.put("chat", "", format!("k{i}"), json!(i)).await.unwrap()
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        assert_eq!(reg.entry_count("chat").await.unwrap(), 16);
        assert_eq!(reg.cache_len(), 16);
        let all = reg.query("chat", "", &QueryOptions::new().all()).await.unwrap();
        assert_eq!(all.len(), 16);
    }

    #[tokio::test]
    async fn failed_head_recompute_leaves_no_entry() {
        let store = Arc::new(InMemoryContentStore::new());
        let backend = Arc::new(FlakyBackend::default());
        let local = ChannelRegistry::new(store.clone()).with_backend(backend.clone());
        local
            .use_channel("chat", Identity::new("alice").unwrap())
            .await
            .unwrap();
        let mut rx = local.subscribe("chat").unwrap();

        backend.armed.store(true, Ordering::SeqCst);
        assert!(matches!(
            local.put("chat", "", "k", json!("ghost")).await,
            Err(CoreError::Log(_))
        ));
        assert_eq!(local.entry_count("chat").await.unwrap(), 0);
        assert_eq!(local.head("chat"), None);
        assert!(rx.try_recv().is_err());

        local.put("chat", "", "other", json!(1)).await.unwrap();
        assert_eq!(local.entry_count("chat").await.unwrap(), 1);
        assert!(get(&local, "k").await.is_empty());

        // A replica syncing the head must agree on what the log holds.
        let remote = ChannelRegistry::new(store);
        remote
            .use_channel("chat", Identity::new("bob").unwrap())
            .await
            .unwrap();
        remote.sync("chat", local.head("chat")).await.unwrap();
        assert!(get(&remote, "k").await.is_empty());
        assert_eq!(get(&remote, "other").await, QueryResult::Values(vec![json!(1)]));
    }
}
