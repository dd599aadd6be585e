//! # Haven Store — the scoped storage engine
//!
//! Per-user virtual file namespaces backed by an ordered key-value
//! metadata index and a filesystem content tree, gated by capability-style
//! path scopes attached to short-lived sessions.
//!
//! [`ScopedStorage`] is the facade the routing layer consumes. It composes
//! the [`authorize::PathAuthorizer`], the metadata index from
//! `haven-index`, the [`quota::QuotaAccountant`], and the
//! [`content::ContentStore`], each injected by ownership at construction.
//! Sessions are issued by an external session authority and arrive here
//! read-only; the consumed slice of that authority is
//! [`directory::UserDirectory`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Path scope authorization
pub mod authorize;

/// Filesystem content storage
pub mod content;

/// User lookup contract
pub mod directory;

/// The storage facade
pub mod engine;

/// Size accounting and quota gates
pub mod quota;

pub use authorize::{AuthorizedPath, PathAuthorizer};
pub use content::{ContentSource, ContentStore};
pub use directory::{MemoryDirectory, UserDirectory, UserRef};
pub use engine::{ScopedStorage, WriteOptions};
pub use quota::{size_of, QuotaAccountant};

pub use haven_core::{
    FileInfo, FileList, FileListAdvance, Scope, Session, StorageConfig, StorageError, StorageStats,
};
