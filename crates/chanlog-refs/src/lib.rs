//! Head pointers for chanlog channels.
//!
//! A channel's head is the content hash of its latest log snapshot. The
//! [`HeadStore`] remembers the last head per channel so a restarted process
//! can reload each channel by syncing from it.
//!
//! # Modules
//!
//! - [`error`] -- Error types for head operations
//! - [`traits`] -- The [`HeadStore`] trait
//! - [`names`] -- Channel name validation
//! - [`memory`] -- In-memory [`InMemoryHeadStore`] for tests
//! - [`file`] -- JSON-file backed [`FileHeadStore`]

pub mod error;
pub mod file;
pub mod memory;
pub mod names;
pub mod traits;

pub use error::{HeadError, Result};
pub use file::FileHeadStore;
pub use memory::InMemoryHeadStore;
pub use names::validate_channel_name;
pub use traits::HeadStore;
