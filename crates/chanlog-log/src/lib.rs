//! Append-only operation log for chanlog.
//!
//! This crate provides the collaborators the channel core is built on:
//! - [`LogHandle`] -- an ordered, joinable sequence of [`LogEntry`]s
//! - [`LogBackend`] -- create/load/snapshot boundary, with [`ContentLog`]
//!   persisting snapshots to a content store
//! - [`Operation`] -- the `Add`/`Put`/`Del` records entries point at
//! - [`OperationFactory`] -- builds, stores, and appends operations, with
//!   [`JsonOperationFactory`] as the stock implementation
//!
//! `LogHandle::join` is a set union over entry hashes ordered by
//! `(clock, author, hash)`, so merging is deterministic, commutative,
//! associative, and idempotent, and the entry count never shrinks.

pub mod backend;
pub mod error;
pub mod factory;
pub mod log;
pub mod operation;

pub use backend::{ContentLog, LogBackend};
pub use error::{LogError, LogResult};
pub use factory::{AppendedOperation, JsonOperationFactory, OperationFactory};
pub use log::{LogEntry, LogHandle};
pub use operation::{OpKind, Operation, PayloadRecord};
