//! # Haven Index — metadata records over an ordered key-value store
//!
//! The physical ordered store is an external collaborator, abstracted as
//! [`OrderedKv`]; [`MemoryKv`] is the bundled reference implementation.
//! Composite key construction and the incremented-prefix scan bound live
//! in [`keys`]; [`MetadataIndex`] provides record CRUD, recursive subtree
//! delete, and windowed prefix listing.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// The metadata index proper
pub mod index;

/// Composite key construction and scan bounds
pub mod keys;

/// Ordered key-value collaborator contract
pub mod kv;

/// In-memory ordered store
pub mod memory;

pub use index::{MetadataIndex, PAGE_SIZE};
pub use keys::{next_prefix, KeySpace};
pub use kv::{KeyRange, KvError, KvResult, OrderedKv};
pub use memory::MemoryKv;
