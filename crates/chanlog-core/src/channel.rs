use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use chanlog_log::LogHandle;
use chanlog_types::{ContentHash, Identity};
use tokio::sync::RwLock;

use crate::event::{ChannelEvent, EventSink, EventStream, LoadOp};

/// A log opened by `use_channel`, together with the user it writes as.
#[derive(Debug)]
pub(crate) struct OpenLog {
    pub handle: LogHandle,
    pub identity: Identity,
}

/// Per-channel state owned by the registry.
///
/// The log slot is empty until the channel is opened; subscribing alone
/// creates the channel with an empty slot.
#[derive(Debug)]
pub(crate) struct Channel {
    name: String,
    pub log: RwLock<Option<OpenLog>>,
    events: EventSink,
    busy: AtomicBool,
    last_write: Mutex<Option<ContentHash>>,
}

impl Channel {
    pub fn new(name: impl Into<String>, event_capacity: usize) -> Self {
        Self {
            name: name.into(),
            log: RwLock::new(None),
            events: EventSink::new(event_capacity),
            busy: AtomicBool::new(false),
            last_write: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscribe(&self) -> EventStream {
        self.events.subscribe()
    }

    pub fn emit_load(&self, op: LoadOp) {
        self.events.emit(ChannelEvent::Load {
            op,
            channel: self.name.clone(),
        });
    }

    pub fn emit_loaded(&self, op: LoadOp) {
        self.events.emit(ChannelEvent::Loaded {
            op,
            channel: self.name.clone(),
        });
    }

    pub fn emit_sync(&self, head: ContentHash) {
        self.events.emit(ChannelEvent::Sync {
            channel: self.name.clone(),
            head,
        });
    }

    pub fn emit_write(&self, head: ContentHash) {
        self.events.emit(ChannelEvent::Write {
            channel: self.name.clone(),
            head,
        });
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Flag the channel busy until the returned guard drops.
    pub fn mark_busy(&self) -> BusyGuard<'_> {
        self.busy.store(true, Ordering::Release);
        BusyGuard { busy: &self.busy }
    }

    pub fn last_write(&self) -> Option<ContentHash> {
        *self.last_write.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_last_write(&self, head: Option<ContentHash>) {
        *self.last_write.lock().unwrap_or_else(PoisonError::into_inner) = head;
    }
}

/// Clears the busy flag on drop, including when opening fails.
pub(crate) struct BusyGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_guard_resets_flag() {
        let ch = Channel::new("chat", 4);
        assert!(!ch.is_busy());
        {
            let _guard = ch.mark_busy();
            assert!(ch.is_busy());
        }
        assert!(!ch.is_busy());
    }

    #[test]
    fn last_write_round_trip() {
        let ch = Channel::new("chat", 4);
        assert_eq!(ch.last_write(), None);
        let head = ContentHash::from_bytes(b"h");
        ch.set_last_write(Some(head));
        assert_eq!(ch.last_write(), Some(head));
    }

    #[test]
    fn events_carry_channel_name() {
        let ch = Channel::new("chat", 4);
        let mut rx = ch.subscribe();
        ch.emit_load(LoadOp::Query);
        assert_eq!(rx.try_recv().unwrap().channel(), "chat");
    }
}
