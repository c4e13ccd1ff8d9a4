//! The [`HeadStore`] trait defining durable head persistence.

use chanlog_types::ContentHash;

use crate::error::Result;

/// Storage backend for per-channel head pointers.
///
/// Implementations must be thread-safe. `set` replaces the previous head;
/// there is no history.
pub trait HeadStore: Send + Sync {
    /// Load persisted heads from the backing source.
    ///
    /// Calling `load` again re-reads the source.
    fn load(&self) -> Result<()>;

    /// The last head recorded for `channel`, if any.
    fn get(&self, channel: &str) -> Result<Option<ContentHash>>;

    /// Record `hash` as the head of `channel`.
    fn set(&self, channel: &str, hash: ContentHash) -> Result<()>;
}
