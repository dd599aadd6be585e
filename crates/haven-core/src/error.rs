//! Unified error taxonomy for the storage engine.

use thiserror::Error;

/// Errors surfaced by storage operations.
///
/// Every failure is synchronous and non-retryable; the engine performs no
/// internal recovery. Retrying idempotent operations is the caller's call.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Traversal or escape attempt in the requested path.
    #[error("malformed path")]
    MalformedPath,

    /// The session's scopes do not cover the requested path.
    #[error("path out of scope")]
    OutOfScope,

    /// A file or user that must exist was absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// The write would push total usage past the global cap.
    #[error("storage max reached ({used} + {incoming} > {limit})")]
    QuotaExceeded {
        /// Bytes currently stored under the storage root.
        used: u64,
        /// Declared length of the incoming write.
        incoming: u64,
        /// Configured global cap.
        limit: u64,
    },

    /// The write would push the user's usage past the per-user cap.
    #[error("user storage max reached ({used} + {incoming} > {limit})")]
    UserQuotaExceeded {
        /// Bytes currently stored under the user's root.
        used: u64,
        /// Declared length of the incoming write.
        incoming: u64,
        /// Configured per-user cap.
        limit: u64,
    },

    /// Input had an invalid shape.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The metadata index failed underneath an operation.
    #[error("metadata index: {0}")]
    Index(String),

    /// The content store failed underneath an operation.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
