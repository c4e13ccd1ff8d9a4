//! Error types for head pointer operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or persisting heads.
#[derive(Debug, Error)]
pub enum HeadError {
    /// The channel name is invalid.
    #[error("invalid channel name: {name:?}: {reason}")]
    InvalidChannelName { name: String, reason: String },

    /// The head file exists but cannot be parsed.
    #[error("corrupt head file {path}: {reason}")]
    CorruptFile { path: PathBuf, reason: String },

    /// A lock guarding the head map was poisoned by a panicking writer.
    #[error("head store lock poisoned")]
    Poisoned,

    /// Serialization failure while writing the head file.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during file-based head operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for head operations.
pub type Result<T> = std::result::Result<T, HeadError>;
