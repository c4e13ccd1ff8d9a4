//! JSON-file backed head store (the "cache file").
//!
//! The file holds a single JSON object mapping channel names to hex heads:
//!
//! ```json
//! { "chat": "5f1c…", "notes": "a0b9…" }
//! ```
//!
//! Every `set` rewrites the whole file through a temporary sibling and a
//! rename, so a crash leaves either the old or the new map on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chanlog_types::ContentHash;
use tracing::debug;

use crate::error::{HeadError, Result};
use crate::traits::HeadStore;

/// A [`HeadStore`] persisted to a JSON file.
#[derive(Debug)]
pub struct FileHeadStore {
    path: PathBuf,
    heads: RwLock<BTreeMap<String, ContentHash>>,
}

impl FileHeadStore {
    /// Create a store backed by `path`. Nothing is read until [`HeadStore::load`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            heads: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a store and immediately load `path` if it exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(path);
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocking std I/O on the caller's thread. The file is one small map
    /// and `set` holds the write lock across the call, so the shared temp
    /// path is never written by two callers at once.
    fn persist(&self, heads: &BTreeMap<String, ContentHash>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(heads)
            .map_err(|e| HeadError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl HeadStore for FileHeadStore {
    fn load(&self) -> Result<()> {
        let loaded: BTreeMap<String, ContentHash> = match std::fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| HeadError::CorruptFile {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %self.path.display(), channels = loaded.len(), "head file loaded");
        *self.heads.write().map_err(|_| HeadError::Poisoned)? = loaded;
        Ok(())
    }

    fn get(&self, channel: &str) -> Result<Option<ContentHash>> {
        let heads = self.heads.read().map_err(|_| HeadError::Poisoned)?;
        Ok(heads.get(channel).copied())
    }

    fn set(&self, channel: &str, hash: ContentHash) -> Result<()> {
        let mut heads = self.heads.write().map_err(|_| HeadError::Poisoned)?;
        heads.insert(channel.to_string(), hash);
        self.persist(&heads)
    }
}
