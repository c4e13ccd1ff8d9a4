use chanlog_types::ContentHash;
use tokio::sync::broadcast;
use tracing::trace;

/// The operation a `Load`/`Loaded` pair brackets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadOp {
    Sync,
    Query,
}

impl std::fmt::Display for LoadOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync => write!(f, "sync"),
            Self::Query => write!(f, "query"),
        }
    }
}

/// Per-channel notification.
///
/// `Load`/`Loaded` bracket every sync and query, including syncs that turn
/// out to be no-ops. `Sync` is only sent when a merge grew the log; `Write`
/// follows every local write once the cache and head pointer are updated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelEvent {
    Load { op: LoadOp, channel: String },
    Loaded { op: LoadOp, channel: String },
    Sync { channel: String, head: ContentHash },
    Write { channel: String, head: ContentHash },
}

impl ChannelEvent {
    pub fn channel(&self) -> &str {
        match self {
            Self::Load { channel, .. }
            | Self::Loaded { channel, .. }
            | Self::Sync { channel, .. }
            | Self::Write { channel, .. } => channel,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Load { .. } => "load",
            Self::Loaded { .. } => "loaded",
            Self::Sync { .. } => "sync",
            Self::Write { .. } => "write",
        }
    }
}

/// A broadcast receiver for one channel's notifications.
pub type EventStream = broadcast::Receiver<ChannelEvent>;

/// Fan-out sink owned by a single channel.
///
/// Emitting never blocks and never fails: with no subscribers the event is
/// simply dropped, and subscribers that fall more than `capacity` events
/// behind observe `RecvError::Lagged`.
#[derive(Debug)]
pub struct EventSink {
    sender: broadcast::Sender<ChannelEvent>,
}

impl EventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> EventStream {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: ChannelEvent) {
        trace!(channel = %event.channel(), kind = event.kind(), "event");
        // No receivers is not an error.
        let _ = self.sender.send(event);
    }
}
