use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chanlog_types::ContentHash;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ContentStore;

/// Filesystem-backed content store.
///
/// Objects live at `<root>/<first two hex chars>/<remaining hex>` as
/// bincode-encoded [`StoredObject`]s. Each write goes to its own temporary
/// file that is renamed into place, so a reader never sees a partial object. Every read
/// re-hashes the object and rejects it on mismatch.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// The directory objects are stored under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, hash: &ContentHash) -> PathBuf {
        let hex = hash.to_hex();
        let (dir, file) = hex.split_at(2);
        self.root.join(dir).join(file)
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn get(&self, hash: &ContentHash) -> StoreResult<StoredObject> {
        let path = self.object_path(hash);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(*hash));
            }
            Err(e) => return Err(e.into()),
        };
        let object: StoredObject =
            bincode::deserialize(&bytes).map_err(|e| StoreError::CorruptObject {
                hash: *hash,
                reason: e.to_string(),
            })?;
        let computed = object.compute_hash();
        if computed != *hash {
            return Err(StoreError::HashMismatch {
                hash: *hash,
                computed,
            });
        }
        Ok(object)
    }

    async fn put(&self, object: StoredObject) -> StoreResult<ContentHash> {
        let hash = object.compute_hash();
        let path = self.object_path(&hash);
        if tokio::fs::try_exists(&path).await? {
            return Ok(hash);
        }
        let bytes =
            bincode::serialize(&object).map_err(|e| StoreError::Serialization(e.to_string()))?;
        tokio::task::spawn_blocking(move || write_object(&path, &bytes))
            .await
            .map_err(std::io::Error::other)??;
        debug!(hash = %hash.short_hex(), kind = %object.kind, size = object.size, "object written");
        Ok(hash)
    }

    async fn exists(&self, hash: &ContentHash) -> StoreResult<bool> {
        Ok(tokio::fs::try_exists(self.object_path(hash)).await?)
    }
}

/// Write `bytes` through a uniquely named temp file in the target directory.
///
/// Several writers may race on the same object. Losing the rename to an
/// identical object already in place counts as success.
fn write_object(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    match tmp.persist(path) {
        Ok(_) => Ok(()),
        Err(_) if path.exists() => Ok(()),
        Err(e) => Err(e.error),
    }
}
