use chanlog_store::{ObjectKind, StoreError};
use chanlog_types::ContentHash;

/// Errors produced by log operations.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("object {hash} is a {kind}, not a log snapshot")]
    NotASnapshot { hash: ContentHash, kind: ObjectKind },

    #[error("cannot decode log snapshot {hash}: {reason}")]
    Decode { hash: ContentHash, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for log operations.
pub type LogResult<T> = Result<T, LogError>;
