use crate::hash::ContentHash;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"chanlog-payload-v1"`) that is
/// prepended to every hash computation, so an operation payload and a log
/// snapshot with identical bytes never share a hash.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for operation payloads.
    pub const PAYLOAD: Self = Self {
        domain: "chanlog-payload-v1",
    };
    /// Hasher for serialized log snapshots (heads).
    pub const SNAPSHOT: Self = Self {
        domain: "chanlog-snapshot-v1",
    };
    /// Hasher for individual log entries.
    pub const ENTRY: Self = Self {
        domain: "chanlog-entry-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ContentHash::from_hash(*hasher.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let h1 = ContentHasher::PAYLOAD.hash(b"hello");
        let h2 = ContentHasher::PAYLOAD.hash(b"hello");
        assert_eq!(h1, h2);
    }

    #[test]
    fn domains_separate_identical_bytes() {
        let payload = ContentHasher::PAYLOAD.hash(b"same");
        let snapshot = ContentHasher::SNAPSHOT.hash(b"same");
        let entry = ContentHasher::ENTRY.hash(b"same");
        assert_ne!(payload, snapshot);
        assert_ne!(payload, entry);
        assert_ne!(snapshot, entry);
    }

    #[test]
    fn domain_hash_differs_from_raw() {
        assert_ne!(ContentHasher::PAYLOAD.hash(b"x"), ContentHash::from_bytes(b"x"));
    }
}
