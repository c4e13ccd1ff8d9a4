//! Channel core for chanlog.
//!
//! Each channel holds one replicated, append-only operation log. The
//! [`ChannelRegistry`] opens channels, writes `Add`/`Put`/`Del` operations,
//! merges remote log snapshots, and answers last-write-wins range queries
//! from a shared [`PayloadCache`] of decoded operations.
//!
//! ```text
//! use_channel ──> LogBackend::create ──> startup sync (if heads configured)
//! add/put/del ──> OperationFactory ──> head_hash ──> HeadStore ──> cache ──> Write
//! sync        ──> from_hash ──> join ──> grew? ──> Sync, HeadStore, populate
//! query       ──> run_query(entries, cache)
//! ```
//!
//! Per-channel notifications ([`ChannelEvent`]) are delivered over a
//! broadcast stream from [`ChannelRegistry::subscribe`].

pub mod auth;
pub mod cache;
mod channel;
pub mod config;
pub mod error;
pub mod event;
pub mod query;
pub mod registry;
pub mod sync;
mod write;

pub use auth::{Action, ChannelAuth, OpenAccess, SharedSecret};
pub use cache::{CachedPayload, PayloadCache};
pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use event::{ChannelEvent, EventStream, LoadOp};
pub use query::{run_query, QueryOptions, QueryResult};
pub use registry::ChannelRegistry;
pub use sync::SyncOutcome;
