//! In-memory head store for tests and ephemeral use.

use std::collections::HashMap;
use std::sync::RwLock;

use chanlog_types::ContentHash;

use crate::error::{HeadError, Result};
use crate::traits::HeadStore;

/// An in-memory implementation of [`HeadStore`].
///
/// Heads are lost when the store is dropped; `load` is a no-op.
#[derive(Debug, Default)]
pub struct InMemoryHeadStore {
    heads: RwLock<HashMap<String, ContentHash>>,
}

impl InMemoryHeadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HeadStore for InMemoryHeadStore {
    fn load(&self) -> Result<()> {
        Ok(())
    }

    fn get(&self, channel: &str) -> Result<Option<ContentHash>> {
        let heads = self.heads.read().map_err(|_| HeadError::Poisoned)?;
        Ok(heads.get(channel).copied())
    }

    fn set(&self, channel: &str, hash: ContentHash) -> Result<()> {
        let mut heads = self.heads.write().map_err(|_| HeadError::Poisoned)?;
        heads.insert(channel.to_string(), hash);
        Ok(())
    }
}
