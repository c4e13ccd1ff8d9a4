//! Merging remote log snapshots into a channel.
//!
//! Every sync is bracketed by `Load`/`Loaded` notifications, including
//! skipped and up-to-date ones. A `Sync` notification, the head pointer
//! update, and cache population only follow a merge that grew the log.
//! Failures propagate before any of those happen and emit no `Loaded`.

use chanlog_types::ContentHash;
use serde::Serialize;
use tracing::{debug, info};

use crate::channel::Channel;
use crate::error::CoreResult;
use crate::event::LoadOp;
use crate::registry::ChannelRegistry;

/// What a sync did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No head given, head equals the last local write, or the channel has
    /// no open log.
    Skipped,
    /// The snapshot was merged but contributed no new entries.
    UpToDate,
    /// The merge added `added` entries; `head` is now the persisted head.
    Merged { added: usize, head: ContentHash },
}

impl SyncOutcome {
    pub fn grew(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}

impl ChannelRegistry {
    /// Merge the log snapshot identified by `head` into `channel`.
    ///
    /// Unknown channels are skipped without notifications.
    pub async fn sync(&self, channel: &str, head: Option<ContentHash>) -> CoreResult<SyncOutcome> {
        match self.get_channel(channel) {
            Some(ch) => self.sync_channel(&ch, head).await,
            None => {
                debug!(channel, "sync skipped: unknown channel");
                Ok(SyncOutcome::Skipped)
            }
        }
    }

    pub(crate) async fn sync_channel(
        &self,
        ch: &Channel,
        head: Option<ContentHash>,
    ) -> CoreResult<SyncOutcome> {
        ch.emit_load(LoadOp::Sync);
        let outcome = self.merge(ch, head).await?;
        ch.emit_loaded(LoadOp::Sync);
        Ok(outcome)
    }

    async fn merge(&self, ch: &Channel, head: Option<ContentHash>) -> CoreResult<SyncOutcome> {
        let channel = ch.name();
        let Some(remote) = head else {
            debug!(channel, "sync skipped: no head");
            return Ok(SyncOutcome::Skipped);
        };
        if ch.last_write() == Some(remote) {
            debug!(channel, head = %remote.short_hex(), "sync skipped: own write");
            return Ok(SyncOutcome::Skipped);
        }
        if ch.log.read().await.is_none() {
            debug!(channel, "sync skipped: channel not open");
            return Ok(SyncOutcome::Skipped);
        }

        let incoming = self.backend.from_hash(self.store.as_ref(), &remote).await?;

        let (added, entries) = {
            let mut guard = ch.log.write().await;
            let Some(open) = guard.as_mut() else {
                return Ok(SyncOutcome::Skipped);
            };
            let added = open.handle.join(&incoming);
            (added, open.handle.items().to_vec())
        };

        if added == 0 {
            debug!(channel, head = %remote.short_hex(), "sync: already up to date");
            return Ok(SyncOutcome::UpToDate);
        }

        ch.emit_sync(remote);
        if let Some(heads) = &self.heads {
            heads.set(channel, remote)?;
        }
        let cached = self.cache.populate(self.store.as_ref(), &entries).await?;
        info!(channel, head = %remote.short_hex(), added, cached, "sync merged");
        Ok(SyncOutcome::Merged { added, head: remote })
    }
}
