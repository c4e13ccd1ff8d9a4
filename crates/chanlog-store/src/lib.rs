//! Content-addressed object storage for chanlog.
//!
//! Operation payloads and serialized log snapshots are stored as immutable
//! objects identified by their BLAKE3 hash (domain-separated by object kind).
//! The store never interprets object contents.
//!
//! # Storage Backends
//!
//! All backends implement the async [`ContentStore`] trait:
//!
//! - [`InMemoryContentStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsContentStore`] -- one file per object under a root directory

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsContentStore;
pub use memory::InMemoryContentStore;
pub use object::{ObjectKind, StoredObject};
pub use traits::ContentStore;
