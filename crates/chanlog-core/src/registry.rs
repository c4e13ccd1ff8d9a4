use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chanlog_log::{ContentLog, JsonOperationFactory, LogBackend, OperationFactory};
use chanlog_refs::{validate_channel_name, HeadStore};
use chanlog_store::ContentStore;
use chanlog_types::{ContentHash, Identity};
use tracing::{debug, info};

use crate::auth::{Action, ChannelAuth, OpenAccess};
use crate::cache::PayloadCache;
use crate::channel::{Channel, OpenLog};
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::event::{EventStream, LoadOp};
use crate::query::{run_query, QueryOptions, QueryResult};

/// Owns every channel of a process and composes the cache, query engine,
/// write pipeline, and sync engine per channel.
///
/// Channels are independent: each has its own log lock, notification sink,
/// busy flag, and last written head. Only the [`PayloadCache`] is shared.
pub struct ChannelRegistry {
    pub(crate) store: Arc<dyn ContentStore>,
    pub(crate) backend: Arc<dyn LogBackend>,
    pub(crate) factory: Arc<dyn OperationFactory>,
    pub(crate) heads: Option<Arc<dyn HeadStore>>,
    auth: Arc<dyn ChannelAuth>,
    pub(crate) cache: PayloadCache,
    config: CoreConfig,
    channels: RwLock<HashMap<String, Arc<Channel>>>,
}

impl ChannelRegistry {
    /// A registry over `store` with the stock log backend and operation
    /// factory, no head persistence, and open access.
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        let config = CoreConfig::default();
        Self {
            store,
            backend: Arc::new(ContentLog),
            factory: Arc::new(JsonOperationFactory),
            heads: None,
            auth: Arc::new(OpenAccess),
            cache: PayloadCache::new(config.fetch_concurrency),
            config,
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Persist heads to `heads`; `use_channel` then syncs from the stored head.
    pub fn with_heads(mut self, heads: Arc<dyn HeadStore>) -> Self {
        self.heads = Some(heads);
        self
    }

    pub fn with_auth(mut self, auth: Arc<dyn ChannelAuth>) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn LogBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_factory(mut self, factory: Arc<dyn OperationFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Apply `config`. Must be called before any payload is cached.
    pub fn with_config(mut self, config: CoreConfig) -> CoreResult<Self> {
        config.validate()?;
        self.cache = PayloadCache::new(config.fetch_concurrency);
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Open `channel` for `user`.
    ///
    /// Creates a fresh log scoped to `user` and, when a head store is
    /// configured, syncs it from the persisted head. The channel is busy for
    /// the duration. Reopening an open channel replaces its log.
    pub async fn use_channel(&self, channel: &str, user: Identity) -> CoreResult<()> {
        validate_channel_name(channel)?;
        let ch = self.channel_or_insert(channel);
        let _busy = ch.mark_busy();
        info!(channel, user = %user, "opening channel");

        let handle = self.backend.create(self.store.as_ref(), &user).await?;
        *ch.log.write().await = Some(OpenLog {
            handle,
            identity: user,
        });
        ch.set_last_write(None);

        if let Some(heads) = &self.heads {
            heads.load()?;
            let head = heads.get(channel)?;
            debug!(channel, head = ?head.map(|h| h.short_hex()), "persisted head");
            self.sync_channel(&ch, head).await?;
        }
        Ok(())
    }

    /// Last-write-wins read of `channel`.
    pub async fn query(
        &self,
        channel: &str,
        password: &str,
        opts: &QueryOptions,
    ) -> CoreResult<QueryResult> {
        let ch = self.open_channel(channel)?;
        self.authorize(channel, password, Action::Read).await?;

        let guard = ch.log.read().await;
        let open = guard
            .as_ref()
            .ok_or_else(|| CoreError::ChannelNotOpen(channel.to_string()))?;

        ch.emit_load(LoadOp::Query);
        let result = run_query(open.handle.items(), &self.cache, opts);
        ch.emit_loaded(LoadOp::Query);
        debug!(channel, results = result.len(), "query");
        Ok(result)
    }

    /// Clear every entry of `channel`'s log. Returns whether the channel had
    /// an open log. Cached payloads are kept.
    ///
    /// With a head store configured, the empty log's head is persisted so a
    /// restarted process does not reload the cleared entries.
    pub async fn delete_channel(&self, channel: &str, password: &str) -> CoreResult<bool> {
        self.authorize(channel, password, Action::Delete).await?;
        let Some(ch) = self.get_channel(channel) else {
            return Ok(false);
        };
        let mut guard = ch.log.write().await;
        let Some(open) = guard.as_mut() else {
            return Ok(false);
        };
        let dropped = open.handle.len();
        open.handle.clear();

        if let Some(heads) = &self.heads {
            let head = self
                .backend
                .head_hash(self.store.as_ref(), &open.handle)
                .await?;
            ch.set_last_write(Some(head));
            heads.set(channel, head)?;
        }
        info!(channel, dropped, "channel cleared");
        Ok(true)
    }

    /// Subscribe to `channel`'s notifications.
    ///
    /// Allowed before `use_channel`, so the startup sync can be observed.
    pub fn subscribe(&self, channel: &str) -> CoreResult<EventStream> {
        validate_channel_name(channel)?;
        Ok(self.channel_or_insert(channel).subscribe())
    }

    /// Whether `channel` is currently being opened.
    pub fn is_busy(&self, channel: &str) -> bool {
        self.get_channel(channel).is_some_and(|ch| ch.is_busy())
    }

    /// The head produced by the last local write to `channel`.
    pub fn head(&self, channel: &str) -> Option<ContentHash> {
        self.get_channel(channel).and_then(|ch| ch.last_write())
    }

    /// Names of every known channel, sorted.
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read_channels().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of entries in `channel`'s log.
    pub async fn entry_count(&self, channel: &str) -> CoreResult<usize> {
        let ch = self.open_channel(channel)?;
        let guard = ch.log.read().await;
        guard
            .as_ref()
            .map(|open| open.handle.len())
            .ok_or_else(|| CoreError::ChannelNotOpen(channel.to_string()))
    }

    pub fn cache(&self) -> &PayloadCache {
        &self.cache
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub(crate) async fn authorize(
        &self,
        channel: &str,
        password: &str,
        action: Action,
    ) -> CoreResult<()> {
        if self.auth.authorize(channel, password, action).await {
            Ok(())
        } else {
            Err(CoreError::AccessDenied {
                channel: channel.to_string(),
                action,
            })
        }
    }

    pub(crate) fn get_channel(&self, channel: &str) -> Option<Arc<Channel>> {
        self.read_channels().get(channel).cloned()
    }

    /// The channel, or `ChannelNotOpen` if it was never created.
    pub(crate) fn open_channel(&self, channel: &str) -> CoreResult<Arc<Channel>> {
        self.get_channel(channel)
            .ok_or_else(|| CoreError::ChannelNotOpen(channel.to_string()))
    }

    fn channel_or_insert(&self, channel: &str) -> Arc<Channel> {
        if let Some(ch) = self.get_channel(channel) {
            return ch;
        }
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(channel.to_string())
            .or_insert_with(|| Arc::new(Channel::new(channel, self.config.event_capacity)))
            .clone()
    }

    fn read_channels(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<Channel>>> {
        self.channels.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("channels", &self.channels())
            .field("cached_payloads", &self.cache.len())
            .field("heads", &self.heads.is_some())
            .field("config", &self.config)
            .finish()
    }
}
