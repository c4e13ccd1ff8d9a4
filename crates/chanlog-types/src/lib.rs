//! Foundation types for chanlog.
//!
//! Every other chanlog crate depends on `chanlog-types`.
//!
//! # Key Types
//!
//! - [`ContentHash`] -- Content-addressed identifier (BLAKE3 hash)
//! - [`ContentHasher`] -- Domain-separated hasher producing [`ContentHash`]es
//! - [`Identity`] -- The acting user that authors log entries

pub mod error;
pub mod hash;
pub mod hasher;
pub mod identity;

pub use error::TypeError;
pub use hash::ContentHash;
pub use hasher::ContentHasher;
pub use identity::Identity;
