use chanlog_log::LogError;
use chanlog_refs::HeadError;
use chanlog_store::StoreError;
use chanlog_types::{ContentHash, TypeError};
use thiserror::Error;

use crate::auth::Action;

/// Errors surfaced by the channel core.
///
/// Nothing is retried internally; every failure reaches the immediate caller.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The channel was never opened with `use_channel`, or its log is gone.
    #[error("channel not open: {0}")]
    ChannelNotOpen(String),

    #[error("access denied: {action} on channel {channel}")]
    AccessDenied { channel: String, action: Action },

    /// A payload fetched from the store is not a valid operation record.
    #[error("cannot decode payload {hash}: {reason}")]
    Decode { hash: ContentHash, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("log error: {0}")]
    Log(#[from] LogError),

    #[error("head store error: {0}")]
    Head(#[from] HeadError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

pub type CoreResult<T> = Result<T, CoreError>;
