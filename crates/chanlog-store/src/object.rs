use chanlog_types::{ContentHash, ContentHasher};
use serde::{Deserialize, Serialize};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// JSON-encoded operation payload referenced by a log entry.
    Payload,
    /// Serialized log snapshot; its hash is a channel head.
    Snapshot,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Payload => write!(f, "payload"),
            Self::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// A stored object: kind tag + serialized data + cached size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The serialized bytes of the object (JSON for both kinds).
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and data.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Shorthand for a payload object.
    pub fn payload(data: Vec<u8>) -> Self {
        Self::new(ObjectKind::Payload, data)
    }

    /// Shorthand for a snapshot object.
    pub fn snapshot(data: Vec<u8>) -> Self {
        Self::new(ObjectKind::Snapshot, data)
    }

    /// Compute the content hash for this object using the hasher of its kind.
    pub fn compute_hash(&self) -> ContentHash {
        let hasher = match self.kind {
            ObjectKind::Payload => &ContentHasher::PAYLOAD,
            ObjectKind::Snapshot => &ContentHasher::SNAPSHOT,
        };
        hasher.hash(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_tracks_data() {
        let obj = StoredObject::payload(b"12345".to_vec());
        assert_eq!(obj.size, 5);
    }

    #[test]
    fn kind_separates_hashes() {
        let payload = StoredObject::payload(b"{}".to_vec());
        let snapshot = StoredObject::snapshot(b"{}".to_vec());
        assert_ne!(payload.compute_hash(), snapshot.compute_hash());
    }

    #[test]
    fn hash_uses_kind_hasher() {
        let obj = StoredObject::snapshot(b"abc".to_vec());
        assert_eq!(obj.compute_hash(), ContentHasher::SNAPSHOT.hash(b"abc"));
    }

    #[test]
    fn kind_display() {
        assert_eq!(ObjectKind::Payload.to_string(), "payload");
        assert_eq!(ObjectKind::Snapshot.to_string(), "snapshot");
    }
}
