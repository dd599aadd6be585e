//! # Haven Core — shared types for the scoped storage engine
//!
//! Pure domain types and path reasoning; no I/O lives here. The ordered
//! key-value contract and metadata index are in `haven-index`; the storage
//! engine itself is in `haven-store`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Engine configuration and TOML loading
pub mod config;

/// Unified error taxonomy
pub mod error;

/// Lexical path resolution for the per-user content tree
pub mod path;

/// Sessions and capability scopes
pub mod session;

/// Wire-level domain types
pub mod types;

pub use config::{ConfigError, StorageConfig};
pub use error::StorageError;
pub use path::{normalize_separators, resolve_under, ResolvedPath};
pub use session::{Scope, Session};
pub use types::{unix_millis, FileInfo, FileList, FileListAdvance, StorageStats};
