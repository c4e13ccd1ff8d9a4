use std::cmp::Ordering;
use std::collections::HashSet;

use chanlog_types::{ContentHash, ContentHasher, Identity};
use serde::{Deserialize, Serialize};

use crate::error::{LogError, LogResult};

/// A single log entry.
///
/// `payload` is the content hash of the stored operation record. `clock` is
/// a Lamport timestamp: one more than the highest clock in the log the entry
/// was appended to. `hash` identifies the entry itself and is what joins
/// deduplicate on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogEntry {
    pub hash: ContentHash,
    pub payload: ContentHash,
    pub author: String,
    pub clock: u64,
}

impl LogEntry {
    pub fn new(payload: ContentHash, author: impl Into<String>, clock: u64) -> Self {
        let author = author.into();
        let hash = Self::compute_hash(&payload, &author, clock);
        Self {
            hash,
            payload,
            author,
            clock,
        }
    }

    /// Returns `true` if `hash` matches the entry's fields.
    pub fn verify(&self) -> bool {
        Self::compute_hash(&self.payload, &self.author, self.clock) == self.hash
    }

    fn compute_hash(payload: &ContentHash, author: &str, clock: u64) -> ContentHash {
        let mut data = Vec::with_capacity(32 + author.len() + 9);
        data.extend_from_slice(payload.as_bytes());
        data.extend_from_slice(&clock.to_le_bytes());
        data.push(b':');
        data.extend_from_slice(author.as_bytes());
        ContentHasher::ENTRY.hash(&data)
    }

    /// Total order used by every log: clock, then author, then hash.
    fn log_order(a: &Self, b: &Self) -> Ordering {
        a.clock
            .cmp(&b.clock)
            .then_with(|| a.author.cmp(&b.author))
            .then_with(|| a.hash.cmp(&b.hash))
    }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    id: String,
    entries: Vec<LogEntry>,
}

/// An append-only, joinable sequence of [`LogEntry`]s.
///
/// Entries are kept sorted by `(clock, author, hash)`. Appends always take
/// the next clock, so they land at the end.
#[derive(Clone, Debug, Default)]
pub struct LogHandle {
    id: String,
    entries: Vec<LogEntry>,
    seen: HashSet<ContentHash>,
}

impl LogHandle {
    /// An empty log with the given id (normally the owning user's name).
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Entries in log order.
    pub fn items(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, entry_hash: &ContentHash) -> bool {
        self.seen.contains(entry_hash)
    }

    /// The clock the next appended entry will carry.
    pub fn next_clock(&self) -> u64 {
        self.entries.last().map(|e| e.clock + 1).unwrap_or(1)
    }

    /// Append an entry pointing at `payload`, authored by `author`.
    pub fn append(&mut self, payload: ContentHash, author: &Identity) -> LogEntry {
        let entry = LogEntry::new(payload, author.name(), self.next_clock());
        self.seen.insert(entry.hash);
        self.entries.push(entry.clone());
        entry
    }

    /// Merge `other` into this log and return how many entries were added.
    ///
    /// Set union over entry hashes; joining the same log twice adds nothing
    /// the second time.
    pub fn join(&mut self, other: &LogHandle) -> usize {
        let before = self.entries.len();
        for entry in &other.entries {
            if self.seen.insert(entry.hash) {
                self.entries.push(entry.clone());
            }
        }
        let added = self.entries.len() - before;
        if added > 0 {
            self.entries.sort_by(LogEntry::log_order);
        }
        added
    }

    /// Drop every entry. The id is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.seen.clear();
    }

    /// Serialize the log as a JSON snapshot.
    pub fn to_snapshot_bytes(&self) -> LogResult<Vec<u8>> {
        let snapshot = Snapshot {
            id: self.id.clone(),
            entries: self.entries.clone(),
        };
        serde_json::to_vec(&snapshot).map_err(|e| LogError::Serialization(e.to_string()))
    }

    /// Rebuild a log from snapshot bytes stored under `hash`.
    ///
    /// Entries whose hash does not match their fields are rejected; the
    /// remaining entries are deduplicated and put back in log order.
    pub fn from_snapshot_bytes(hash: &ContentHash, bytes: &[u8]) -> LogResult<Self> {
        let snapshot: Snapshot = serde_json::from_slice(bytes).map_err(|e| LogError::Decode {
            hash: *hash,
            reason: e.to_string(),
        })?;
        if let Some(bad) = snapshot.entries.iter().find(|e| !e.verify()) {
            return Err(LogError::Decode {
                hash: *hash,
                reason: format!("entry {} fails verification", bad.hash.short_hex()),
            });
        }
        let mut log = LogHandle::new(snapshot.id);
        let mut incoming = LogHandle::new(String::new());
        incoming.entries = snapshot.entries;
        log.join(&incoming);
        Ok(log)
    }
}
